use crate::types::scoring::{round3, MetricResult, Score, ScoreReport, WeightTable};
use std::collections::BTreeMap;

/// Collapse per-metric results into one report.
///
/// The net score is the weighted mean over metrics that produced a score,
/// renormalized by the weights actually used. Keys without a weight are
/// carried in `per_metric` but never contribute.
pub fn aggregate(results: BTreeMap<String, MetricResult>, weights: &WeightTable) -> ScoreReport {
    let (numerator, denominator) = weights
        .iter()
        .filter_map(|(key, weight)| {
            results
                .get(key)
                .and_then(|result| result.score)
                .map(|score| (score * weight, weight))
        })
        .fold((0.0, 0.0), |(num, den), (part, weight)| (num + part, den + weight));

    let net_score: Score = if denominator > 0.0 {
        round3(numerator / denominator).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let net_latency_ms = results
        .values()
        .fold(0u64, |sum, result| sum.saturating_add(result.latency_ms));

    ScoreReport {
        per_metric: results,
        net_score,
        net_latency_ms,
        order: weights.keys(),
    }
}
