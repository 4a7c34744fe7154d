pub mod json;
pub mod md;
pub mod ndjson;

use crate::error::RaterError;
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::ScoreReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Ndjson,
    Md,
}

/// One rated artifact as handed to ingestion: identity first, then the
/// report fields in weight-table order.
#[derive(Debug, Serialize)]
pub struct Record<'a> {
    pub name: &'a str,
    pub category: &'static str,
    #[serde(flatten)]
    pub report: &'a ScoreReport,
}

impl<'a> Record<'a> {
    pub fn new(artifact: &'a ArtifactDescriptor, report: &'a ScoreReport) -> Self {
        Self {
            name: &artifact.name,
            category: artifact.artifact_type.category(),
            report,
        }
    }
}

pub fn render(record: &Record<'_>, format: OutputFormat) -> Result<String, RaterError> {
    match format {
        OutputFormat::Json => json::to_json(record).map_err(RaterError::Json),
        OutputFormat::Ndjson => ndjson::to_line(record).map_err(RaterError::Json),
        OutputFormat::Md => Ok(md::to_markdown(record)),
    }
}
