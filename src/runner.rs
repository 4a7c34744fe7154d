use crate::error::{RaterError, Result};
use crate::metrics::{Metric, Registry};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::MetricResult;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub const DEFAULT_WORKERS: usize = 8;
pub const MAX_WORKERS: usize = 32;

/// Fans every registered metric out over a bounded worker pool and waits for
/// all of them.
pub struct Runner {
    pool: ThreadPool,
}

impl Runner {
    pub fn new(workers: usize) -> Result<Self> {
        if !(1..=MAX_WORKERS).contains(&workers) {
            return Err(RaterError::WorkerPool(format!(
                "worker count must be between 1 and {MAX_WORKERS} (found {workers})"
            )));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("rater-worker-{index}"))
            .build()
            .map_err(|err| RaterError::WorkerPool(err.to_string()))?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Results keyed by metric key. Failed or panicking metrics come back as
    /// [`MetricResult::failed`]; every score is sanitized into `[0, 1]`.
    pub fn run(
        &self,
        registry: &Registry,
        artifact: &ArtifactDescriptor,
    ) -> BTreeMap<String, MetricResult> {
        self.pool.install(|| {
            registry
                .metrics()
                .par_iter()
                .map(|metric| {
                    let outcome = evaluate_guarded(metric, artifact);
                    (metric.key().to_string(), downgrade(metric.key(), outcome))
                })
                .collect()
        })
    }
}

/// Evaluate one metric, turning a panic into an error.
fn evaluate_guarded(metric: &Arc<dyn Metric>, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
    catch_unwind(AssertUnwindSafe(|| metric.evaluate(artifact)))
        .unwrap_or_else(|payload| Err(RaterError::MetricPanicked(panic_message(payload.as_ref()))))
}

fn downgrade(key: &str, outcome: Result<MetricResult>) -> MetricResult {
    match outcome {
        Ok(result) => result.sanitized(),
        Err(err) => {
            tracing::warn!(metric = key, error = %err, "metric failed; reporting as not computed");
            MetricResult::failed()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
