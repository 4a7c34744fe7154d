use crate::error::{RaterError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashSet};

pub type Score = f64;

/// Per-device breakdown exposed by the size scorer.
pub type DeviceScores = BTreeMap<String, Score>;

pub const SIZE_SCORE_KEY: &str = "size_score";
pub const DEVICE_CLASSES: [&str; 4] = ["raspberry_pi", "jetson_nano", "desktop_pc", "aws_server"];

pub const DEFAULT_WEIGHTS: [(&str, Score); 10] = [
    ("ramp_up_time", 0.10),
    ("bus_factor", 0.10),
    ("performance_claims", 0.10),
    ("license", 0.10),
    (SIZE_SCORE_KEY, 0.10),
    ("dataset_and_code_score", 0.10),
    ("dataset_quality", 0.10),
    ("code_quality", 0.10),
    ("reviewedness", 0.10),
    ("reproducibility", 0.10),
];

pub fn round3(value: Score) -> Score {
    (value * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricResult {
    /// `None` when the metric could not be computed; never conflated with 0.0.
    pub score: Option<Score>,
    pub latency_ms: u64,
    pub breakdown: Option<DeviceScores>,
}

impl MetricResult {
    pub fn new(score: Option<Score>, latency_ms: u64) -> Self {
        Self {
            score,
            latency_ms,
            breakdown: None,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn with_breakdown(mut self, breakdown: DeviceScores) -> Self {
        self.breakdown = Some(breakdown);
        self
    }

    /// Drop non-finite scores and clamp the rest into `[0, 1]`.
    pub fn sanitized(mut self) -> Self {
        self.score = self
            .score
            .filter(|score| score.is_finite())
            .map(|score| score.clamp(0.0, 1.0));
        self
    }
}

impl From<Score> for MetricResult {
    fn from(score: Score) -> Self {
        Self::new(Some(score), 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    entries: Vec<(String, Score)>,
}

impl WeightTable {
    /// Build a table, rejecting duplicate keys, out-of-range values and sums
    /// away from 1.0.
    pub fn new(entries: Vec<(String, Score)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (key, weight) in &entries {
            if !seen.insert(key.as_str()) {
                return Err(RaterError::ConfigParse(format!(
                    "weights contains duplicate key: {key}"
                )));
            }
            if !(0.0..=1.0).contains(weight) {
                return Err(RaterError::ConfigParse(format!(
                    "weights.{key} must be between 0.0 and 1.0"
                )));
            }
        }
        let sum: Score = entries.iter().map(|(_, weight)| weight).sum();
        if (sum - 1.0).abs() > 0.001 {
            return Err(RaterError::ConfigParse(format!(
                "weights must sum to 1.0 (found {sum:.3})"
            )));
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Score)> {
        self.entries
            .iter()
            .map(|(key, weight)| (key.as_str(), *weight))
    }

    pub fn get(&self, key: &str) -> Option<Score> {
        self.iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, weight)| weight)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_WEIGHTS
                .iter()
                .map(|(key, weight)| (key.to_string(), *weight))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub per_metric: BTreeMap<String, MetricResult>,
    pub net_score: Score,
    pub net_latency_ms: u64,
    /// Field order of the serialized report, taken from the weight table.
    pub order: Vec<String>,
}

impl ScoreReport {
    pub fn score(&self, key: &str) -> Option<Score> {
        self.per_metric.get(key).and_then(|result| result.score)
    }
}

impl Serialize for ScoreReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.order.len() * 2))?;
        map.serialize_entry("net_score", &self.net_score)?;
        map.serialize_entry("net_score_latency", &self.net_latency_ms)?;
        for key in &self.order {
            let result = self.per_metric.get(key);
            let latency = result.map(|result| result.latency_ms).unwrap_or(0);
            match result.and_then(|result| result.breakdown.as_ref()) {
                Some(breakdown) => map.serialize_entry(key, breakdown)?,
                None if key == SIZE_SCORE_KEY => {
                    let zeroed: DeviceScores = DEVICE_CLASSES
                        .iter()
                        .map(|device| (device.to_string(), 0.0))
                        .collect();
                    map.serialize_entry(key, &zeroed)?;
                }
                None => map.serialize_entry(key, &result.and_then(|result| result.score))?,
            }
            map.serialize_entry(&format!("{key}_latency"), &latency)?;
        }
        map.end()
    }
}
