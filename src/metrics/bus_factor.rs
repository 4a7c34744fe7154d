use super::{fetch_model_info, timed_score, Metric};
use crate::error::Result;
use crate::fetch::{ModelHub, ModelInfo};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{round3, MetricResult, Score};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const STALE_AFTER_DAYS: f64 = 365.0;

/// Popularity and maintenance freshness as a proxy for how many people
/// keep the model alive.
pub struct BusFactor {
    hub: Arc<dyn ModelHub>,
}

impl BusFactor {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }
}

impl Metric for BusFactor {
    fn key(&self) -> &str {
        "bus_factor"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| {
            let (_, info) = fetch_model_info(self.hub.as_ref(), artifact, self.key())?;
            Some(score_info(&info, Utc::now()))
        }))
    }
}

pub fn score_info(info: &ModelInfo, now: DateTime<Utc>) -> Score {
    let downloads_norm = ((1.0 + info.downloads() as f64).log10() / 6.0).min(1.0);
    let age_days = info
        .last_modified
        .as_deref()
        .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
        .map(|modified| (now - modified.with_timezone(&Utc)).num_seconds() as f64 / 86_400.0)
        .unwrap_or(STALE_AFTER_DAYS);
    let freshness = (1.0 - age_days / STALE_AFTER_DAYS).clamp(0.0, 1.0);
    round3(0.6 * downloads_norm + 0.4 * freshness)
}
