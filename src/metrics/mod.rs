//! Trust metrics and the registry that holds them.
//!
//! Each scorer is a small struct over the shared collaborators in
//! [`Services`]. Scorers recover their own fetch failures into the value
//! documented for that metric; an `Err` out of `evaluate` is reserved for
//! bugs and is downgraded by the runner.

pub mod bus_factor;
pub mod code_quality;
pub mod dataset_code;
pub mod dataset_quality;
pub mod license;
pub mod markdown;
pub mod performance;
pub mod ramp_up;
pub mod reproducibility;
pub mod reviewedness;
pub mod size;

use crate::error::{RaterError, Result};
use crate::fetch::{hub, ModelHub, ModelInfo, Services};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::MetricResult;
use std::sync::Arc;
use std::time::Instant;

pub trait Metric: Send + Sync {
    /// Unique key, also the report field name.
    fn key(&self) -> &str;
    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult>;
}

/// Ordered set of metrics with unique keys.
#[derive(Clone, Default)]
pub struct Registry {
    metrics: Vec<Arc<dyn Metric>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metric: Arc<dyn Metric>) -> Result<()> {
        if self.metrics.iter().any(|known| known.key() == metric.key()) {
            return Err(RaterError::DuplicateMetric(metric.key().to_string()));
        }
        self.metrics.push(metric);
        Ok(())
    }

    /// The ten standard scorers, in report order.
    pub fn standard(services: &Services) -> Result<Self> {
        let hub = &services.hub;
        let mut registry = Self::new();
        registry.register(Arc::new(ramp_up::RampUpTime::new(hub.clone())))?;
        registry.register(Arc::new(bus_factor::BusFactor::new(hub.clone())))?;
        registry.register(Arc::new(performance::PerformanceClaims::new(hub.clone())))?;
        registry.register(Arc::new(license::License::new(hub.clone())))?;
        registry.register(Arc::new(size::SizeScore::new(hub.clone())))?;
        registry.register(Arc::new(dataset_code::DatasetAndCode::new(hub.clone())))?;
        registry.register(Arc::new(dataset_quality::DatasetQuality::new(hub.clone())))?;
        registry.register(Arc::new(code_quality::CodeQuality::new(
            hub.clone(),
            services.analyzer.clone(),
            services.max_source_files,
        )))?;
        registry.register(Arc::new(reviewedness::Reviewedness::new(
            hub.clone(),
            services.code_host.clone(),
            services.max_pulls,
        )))?;
        registry.register(Arc::new(reproducibility::Reproducibility::new(
            hub.clone(),
            services.judge.clone(),
        )))?;
        Ok(registry)
    }

    pub fn metrics(&self) -> &[Arc<dyn Metric>] {
        &self.metrics
    }

    pub fn keys(&self) -> Vec<&str> {
        self.metrics.iter().map(|metric| metric.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Run `f` and report how long it took in whole milliseconds.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, u64) {
    let start = Instant::now();
    let value = f();
    let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    (value, elapsed)
}

/// Time a scorer that yields a bare optional score.
pub(crate) fn timed_score(f: impl FnOnce() -> Option<f64>) -> MetricResult {
    let (score, latency_ms) = timed(f);
    MetricResult::new(score, latency_ms)
}

/// Hub model info for the descriptor's source URL, logging fetch failures.
pub(crate) fn fetch_model_info(
    hub: &dyn ModelHub,
    artifact: &ArtifactDescriptor,
    metric: &str,
) -> Option<(String, ModelInfo)> {
    let model_id = hub::model_id(&artifact.source_url)?;
    match hub.model_info(&model_id) {
        Ok(info) => Some((model_id, info)),
        Err(err) => {
            tracing::debug!(metric, model = %model_id, error = %err, "model info unavailable");
            None
        }
    }
}

/// README text for a hub model. `Err` carries the transport failure so each
/// scorer can pick its own fallback.
pub(crate) fn fetch_readme(
    hub: &dyn ModelHub,
    model_id: &str,
    metric: &str,
) -> Result<String> {
    hub.readme(model_id).map_err(|err| {
        tracing::debug!(metric, model = %model_id, error = %err, "readme unavailable");
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fakes::{services, FakeAnalyzer, FakeCodeHost, FakeHub, FakeJudge};
    use crate::types::scoring::DEFAULT_WEIGHTS;

    struct Constant(&'static str);

    impl Metric for Constant {
        fn key(&self) -> &str {
            self.0
        }

        fn evaluate(&self, _artifact: &ArtifactDescriptor) -> Result<MetricResult> {
            Ok(MetricResult::from(1.0))
        }
    }

    #[test]
    fn register_rejects_duplicate_keys() {
        let mut registry = Registry::new();
        registry
            .register(Arc::new(Constant("license")))
            .expect("first registration should succeed");
        let err = registry
            .register(Arc::new(Constant("license")))
            .expect_err("duplicate should be rejected");
        assert!(matches!(err, RaterError::DuplicateMetric(key) if key == "license"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn standard_registry_matches_default_weight_order() {
        let services = services(
            FakeHub::default(),
            FakeCodeHost::default(),
            FakeJudge::replying(None),
            FakeAnalyzer::default(),
        );
        let registry = Registry::standard(&services).expect("standard registry should build");
        let expected: Vec<&str> = DEFAULT_WEIGHTS.iter().map(|(key, _)| *key).collect();
        assert_eq!(registry.keys(), expected);
    }

    #[test]
    fn timed_reports_elapsed_time() {
        let (value, elapsed) = timed(|| {
            std::thread::sleep(std::time::Duration::from_millis(15));
            7
        });
        assert_eq!(value, 7);
        assert!(elapsed >= 15);
    }
}
