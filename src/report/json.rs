use super::Record;

pub fn to_json(record: &Record<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}
