use super::{fetch_model_info, timed_score, Metric};
use crate::error::Result;
use crate::fetch::analyzer::bucket;
use crate::fetch::{ModelHub, StaticAnalyzer};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{MetricResult, Score};
use std::sync::Arc;

/// Score when a repository ships no Python sources at all.
pub const NEUTRAL_SCORE: Score = 0.5;

/// Lints the repository's Python sources and averages the bucketed ratings.
pub struct CodeQuality {
    hub: Arc<dyn ModelHub>,
    analyzer: Arc<dyn StaticAnalyzer>,
    max_files: usize,
}

impl CodeQuality {
    pub fn new(hub: Arc<dyn ModelHub>, analyzer: Arc<dyn StaticAnalyzer>, max_files: usize) -> Self {
        Self {
            hub,
            analyzer,
            max_files,
        }
    }

    fn score(&self, artifact: &ArtifactDescriptor) -> Option<Score> {
        let (model_id, info) = fetch_model_info(self.hub.as_ref(), artifact, self.key())?;
        let sources: Vec<&str> = info
            .file_names()
            .into_iter()
            .filter(|name| name.ends_with(".py"))
            .take(self.max_files)
            .collect();
        if sources.is_empty() {
            return Some(NEUTRAL_SCORE);
        }

        let buckets: Vec<Score> = sources
            .iter()
            .filter_map(|name| self.rate_file(&model_id, name))
            .collect();
        mean(&buckets)
    }

    fn rate_file(&self, model_id: &str, name: &str) -> Option<Score> {
        let source = self.hub.raw_file(model_id, name).ok()?;
        match self.analyzer.rate(&source, name) {
            Ok(rating) => rating.and_then(bucket),
            Err(err) => {
                tracing::debug!(model = model_id, file = name, error = %err, "analyzer failed");
                None
            }
        }
    }
}

impl Metric for CodeQuality {
    fn key(&self) -> &str {
        "code_quality"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| self.score(artifact)))
    }
}

fn mean(values: &[Score]) -> Option<Score> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<Score>() / values.len() as Score)
    }
}
