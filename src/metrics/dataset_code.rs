use super::{fetch_model_info, fetch_readme, timed_score, Metric};
use crate::error::Result;
use crate::fetch::ModelHub;
use crate::types::artifact::{ArtifactDescriptor, ArtifactType};
use crate::types::scoring::{MetricResult, Score};
use std::sync::Arc;

const PYTHON_USAGE_SIGNALS: [&str; 6] = [
    "```python",
    "from transformers import",
    "autotokenizer",
    "automodel",
    "pipeline(",
    "pip install transformers",
];

/// Whether training data and runnable code are both discoverable.
pub struct DatasetAndCode {
    hub: Arc<dyn ModelHub>,
}

impl DatasetAndCode {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }

    fn availability(&self, artifact: &ArtifactDescriptor) -> (bool, bool) {
        let mut dataset = artifact.dataset_url.is_some()
            || artifact.artifact_type == ArtifactType::Dataset;
        let mut code =
            artifact.code_url.is_some() || artifact.artifact_type == ArtifactType::Code;

        let Some((model_id, info)) = fetch_model_info(self.hub.as_ref(), artifact, self.key())
        else {
            return (dataset, code);
        };
        dataset |= !info.declared_datasets().is_empty();
        code |= info
            .file_names()
            .iter()
            .any(|name| name.to_lowercase().ends_with(".py"));

        if !code {
            code = fetch_readme(self.hub.as_ref(), &model_id, self.key())
                .map(|readme| readme_shows_usage(&readme))
                .unwrap_or(false);
        }
        (dataset, code)
    }
}

impl Metric for DatasetAndCode {
    fn key(&self) -> &str {
        "dataset_and_code_score"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| {
            let (dataset, code) = self.availability(artifact);
            Some(availability_score(dataset, code))
        }))
    }
}

pub fn readme_shows_usage(readme: &str) -> bool {
    let lower = readme.to_lowercase();
    PYTHON_USAGE_SIGNALS
        .iter()
        .any(|signal| lower.contains(signal))
}

pub fn availability_score(dataset: bool, code: bool) -> Score {
    match (dataset, code) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}
