use super::Record;
use crate::types::scoring::{DEVICE_CLASSES, SIZE_SCORE_KEY};

pub fn to_markdown(record: &Record<'_>) -> String {
    let report = record.report;
    let mut output = String::new();
    output.push_str(&format!("# Trust Report: {}\n\n", record.name));
    output.push_str(&format!("Category: {}\n\n", record.category));
    output.push_str(&format!(
        "Net score: {:.3} ({} ms)\n\n",
        report.net_score, report.net_latency_ms
    ));

    output.push_str("## Metrics\n\n");
    output.push_str("| metric | score | latency (ms) |\n|---|---|---|\n");
    for key in &report.order {
        let result = report.per_metric.get(key);
        let score = result
            .and_then(|result| result.score)
            .map(|score| format!("{score:.3}"))
            .unwrap_or_else(|| "n/a".to_string());
        let latency = result.map(|result| result.latency_ms).unwrap_or(0);
        output.push_str(&format!("| {key} | {score} | {latency} |\n"));
    }

    if let Some(breakdown) = report
        .per_metric
        .get(SIZE_SCORE_KEY)
        .and_then(|result| result.breakdown.as_ref())
    {
        output.push_str("\n## Device Fit\n\n");
        for device in DEVICE_CLASSES {
            let score = breakdown.get(device).copied().unwrap_or(0.0);
            output.push_str(&format!("- {device}: {score:.3}\n"));
        }
    }

    output
}
