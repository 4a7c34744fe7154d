use super::{fetch_model_info, timed_score, Metric};
use crate::error::Result;
use crate::fetch::{ModelHub, ModelInfo};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{round3, MetricResult, Score};
use std::sync::Arc;

/// How quickly a newcomer can get productive: documentation presence,
/// community interest and example material.
pub struct RampUpTime {
    hub: Arc<dyn ModelHub>,
}

impl RampUpTime {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }
}

impl Metric for RampUpTime {
    fn key(&self) -> &str {
        "ramp_up_time"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| {
            let (_, info) = fetch_model_info(self.hub.as_ref(), artifact, self.key())?;
            Some(score_info(&info))
        }))
    }
}

pub fn score_info(info: &ModelInfo) -> Score {
    let likes_score = ((1.0 + info.likes() as f64).log10() / 3.0).clamp(0.0, 1.0);
    let documented = info
        .file_names()
        .iter()
        .any(|name| name.eq_ignore_ascii_case("readme.md"))
        || info.has_card();
    let readme_score = if documented { 1.0 } else { 0.3 };
    let bonus = if info
        .tags()
        .iter()
        .any(|tag| tag.contains("example") || tag.contains("tutorial"))
    {
        0.1
    } else {
        0.0
    };
    round3((0.6 * readme_score + 0.4 * likes_score + bonus).clamp(0.0, 1.0))
}
