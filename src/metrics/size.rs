use super::{fetch_model_info, timed, Metric};
use crate::error::Result;
use crate::fetch::ModelHub;
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{round3, DeviceScores, MetricResult, Score, SIZE_SCORE_KEY};
use std::sync::Arc;

const WEIGHT_EXTENSIONS: [&str; 10] = [
    ".safetensors",
    ".bin",
    ".h5",
    ".hdf5",
    ".ckpt",
    ".pt",
    ".pth",
    ".onnx",
    ".gguf",
    ".msgpack",
];
const WEIGHT_PREFIXES: [&str; 6] = [
    "pytorch_model",
    "model",
    "tf_model",
    "flax_model",
    "diffusion_pytorch_model",
    "adapter_model",
];

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;
const MIN_FILE_BYTES: u64 = 5 * MIB;
const MAX_TOTAL_BYTES: u64 = 120 * GIB;

/// `(upper bound in GiB, score)` steps per device class; sizes above the
/// last bound score 0.0.
const DEVICE_STEPS: [(&str, &[(f64, Score)]); 4] = [
    (
        "raspberry_pi",
        &[(0.2, 1.0), (0.5, 0.8), (1.0, 0.6), (2.0, 0.4), (4.0, 0.2)],
    ),
    (
        "jetson_nano",
        &[(0.5, 1.0), (1.0, 0.75), (2.0, 0.5), (4.0, 0.25)],
    ),
    (
        "desktop_pc",
        &[(4.0, 1.0), (8.0, 0.8), (16.0, 0.6), (32.0, 0.4), (64.0, 0.2)],
    ),
    (
        "aws_server",
        &[(40.0, 1.0), (60.0, 0.8), (80.0, 0.6), (100.0, 0.4), (120.0, 0.2)],
    ),
];

/// Rates how deployable a model is on four device classes from the total
/// size of its weight files.
pub struct SizeScore {
    hub: Arc<dyn ModelHub>,
}

impl SizeScore {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }

    fn total_weight_bytes(&self, artifact: &ArtifactDescriptor) -> Option<u64> {
        let (model_id, info) = fetch_model_info(self.hub.as_ref(), artifact, self.key())?;
        let revision = info.sha.as_deref().filter(|sha| !sha.is_empty())?;

        let mut total = 0u64;
        for name in info.file_names().into_iter().filter(|name| is_weight_file(name)) {
            let size = match self.hub.file_size(&model_id, revision, name) {
                Ok(Some(size)) => size,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(model = %model_id, file = name, error = %err, "size probe failed");
                    continue;
                }
            };
            if size < MIN_FILE_BYTES {
                continue;
            }
            total = total.saturating_add(size);
            if total >= MAX_TOTAL_BYTES {
                break;
            }
        }
        (total > 0).then_some(total)
    }
}

impl Metric for SizeScore {
    fn key(&self) -> &str {
        SIZE_SCORE_KEY
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        let (total, latency_ms) = timed(|| self.total_weight_bytes(artifact));
        let Some(total) = total else {
            return Ok(MetricResult::new(None, latency_ms));
        };
        let devices = device_scores(total as f64 / GIB as f64);
        Ok(MetricResult::new(Some(mean_score(&devices)), latency_ms).with_breakdown(devices))
    }
}

pub fn is_weight_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    let base = lower.rsplit('/').next().unwrap_or(&lower);
    WEIGHT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || WEIGHT_PREFIXES.iter().any(|prefix| base.starts_with(prefix))
}

pub fn device_scores(gib: f64) -> DeviceScores {
    DEVICE_STEPS
        .iter()
        .map(|(device, steps)| {
            let score = steps
                .iter()
                .find(|(bound, _)| gib <= *bound)
                .map(|(_, score)| *score)
                .unwrap_or(0.0);
            (device.to_string(), round3(score))
        })
        .collect()
}

pub fn mean_score(devices: &DeviceScores) -> Score {
    if devices.is_empty() {
        return 0.0;
    }
    round3(devices.values().sum::<Score>() / devices.len() as Score)
}
