//! Turns a URL list into rating requests.
//!
//! Dataset and code URLs attach to the next model URL in the list; unknown
//! lines are skipped with a warning.

use crate::error::{RaterError, Result};
use crate::types::artifact::{ArtifactDescriptor, ArtifactType};
use std::path::Path;

#[derive(Debug, Default)]
pub struct BatchRouter {
    pending_dataset: Option<String>,
    pending_code: Option<String>,
}

impl BatchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a descriptor when the line is a model URL.
    pub fn push(&mut self, line: &str) -> Option<ArtifactDescriptor> {
        let url = line.trim();
        if url.is_empty() || url.starts_with('#') {
            return None;
        }
        match ArtifactType::classify(url) {
            Some(ArtifactType::Dataset) => {
                self.pending_dataset = Some(url.to_string());
                None
            }
            Some(ArtifactType::Code) => {
                self.pending_code = Some(url.to_string());
                None
            }
            Some(ArtifactType::Model) => Some(
                ArtifactDescriptor::new(ArtifactType::Model, url)
                    .with_dataset_url(self.pending_dataset.take())
                    .with_code_url(self.pending_code.take()),
            ),
            None => {
                tracing::warn!(line = url, "unrecognised URL, skipping");
                None
            }
        }
    }

    /// Route every line of `text`.
    pub fn route(&mut self, text: &str) -> Vec<ArtifactDescriptor> {
        text.lines().filter_map(|line| self.push(line)).collect()
    }
}

pub fn read_url_file(path: &Path) -> Result<Vec<ArtifactDescriptor>> {
    if !path.exists() {
        return Err(RaterError::PathNotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    let descriptors = BatchRouter::new().route(&text);
    tracing::debug!(path = %path.display(), count = descriptors.len(), "url file routed");
    Ok(descriptors)
}
