use super::markdown::sections_where;
use super::{fetch_readme, timed_score, Metric};
use crate::error::Result;
use crate::fetch::{hub, ModelHub};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{MetricResult, Score};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

const PROXIMITY_WINDOW: usize = 100;
const DATE_PROBE: usize = 10;
const PLACEHOLDERS: [&str; 3] = ["more information needed", "tbd", "coming soon"];

static METRIC_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:accuracy|acc|f1|f1-score|precision|recall|auc|auroc|bleu|rouge(?:-\w+)?|meteor|ter|chrf|mse|rmse|mae|r2|perplexity|wer|cer|map|mrr|ndcg|exact match|em|top-1|top-5|glue|superglue|squad|librispeech|common voice|wmt|imagenet)\b",
    )
    .expect("valid metric word regex")
});
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\s*%?").expect("valid number regex"));
static DATE_OR_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b20\d{2}\b|\b\d{4}-\d{2}-\d{2}\b|\bv?\d+(?:\.\d+){2,}\b")
        .expect("valid date regex")
});
static EVAL_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:evaluation|results?|benchmarks?|performance|metrics?)\b")
        .expect("valid heading regex")
});
static MODEL_INDEX_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bvalue\s*:\s*[-+]?\d+(?:\.\d+)?").expect("valid model-index regex")
});
static TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\|.*\|\n\|[-:\s|]+\|\n(?:\|.*\|\n)+").expect("valid table regex")
});

/// Whether the model card backs its quality with numeric evaluation results.
pub struct PerformanceClaims {
    hub: Arc<dyn ModelHub>,
}

impl PerformanceClaims {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }

    fn score(&self, artifact: &ArtifactDescriptor) -> Option<Score> {
        let model_id = hub::model_id(&artifact.source_url)?;
        let readme = fetch_readme(self.hub.as_ref(), &model_id, self.key()).ok()?;
        Some(if has_real_metrics(&readme) { 1.0 } else { 0.0 })
    }
}

impl Metric for PerformanceClaims {
    fn key(&self) -> &str {
        "performance_claims"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| self.score(artifact)))
    }
}

pub fn has_real_metrics(text: &str) -> bool {
    let text = text.to_lowercase();
    if text.trim().is_empty() {
        return false;
    }
    if text.contains("model-index")
        && text.contains("metrics:")
        && MODEL_INDEX_VALUE_RE.is_match(&text)
    {
        return true;
    }

    let mut sections = sections_where(&text, |title| EVAL_HEADING_RE.is_match(title));
    if sections.is_empty() {
        sections.push(&text);
    }
    sections
        .into_iter()
        .filter(|section| !PLACEHOLDERS.iter().any(|p| section.contains(p)))
        .any(|section| has_metric_near_number(section) || has_metric_table(section))
}

fn has_metric_near_number(section: &str) -> bool {
    NUMBER_RE.find_iter(section).any(|number| {
        let start = number.start();
        let probe = clamp_slice(section, start.saturating_sub(DATE_PROBE), start + DATE_PROBE);
        if DATE_OR_VERSION_RE.is_match(probe) {
            return false;
        }
        let window = clamp_slice(
            section,
            start.saturating_sub(PROXIMITY_WINDOW),
            start + PROXIMITY_WINDOW,
        );
        METRIC_WORD_RE.is_match(window)
    })
}

fn has_metric_table(section: &str) -> bool {
    TABLE_RE.find_iter(section).any(|table| {
        let mut rows = table.as_str().trim_start_matches('\n').lines();
        let header = rows.next().unwrap_or_default();
        METRIC_WORD_RE.is_match(header) && rows.any(|row| NUMBER_RE.is_match(row))
    })
}

/// `&text[start..end]` widened to the nearest char boundaries.
fn clamp_slice(text: &str, start: usize, end: usize) -> &str {
    let mut start = start.min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = end.min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}
