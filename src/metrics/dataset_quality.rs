use super::markdown::{find_section, title_starts_with_word};
use super::{fetch_readme, timed_score, Metric};
use crate::error::Result;
use crate::fetch::{hub, ModelHub};
use crate::types::artifact::{display_name, ArtifactDescriptor};
use crate::types::scoring::{round3, MetricResult, Score};
use std::sync::Arc;

const TRUSTED_DATASETS: [&str; 15] = [
    "bookcorpus",
    "wikipedia",
    "openwebtext",
    "common crawl",
    "c4",
    "pile",
    "imagenet",
    "coco",
    "librispeech",
    "laion",
    "squad",
    "squad v2",
    "mnist",
    "cifar-10",
    "cifar10",
];

const HYGIENE_KEYWORDS: [&str; 17] = [
    "dedup",
    "de-dup",
    "de-duplicate",
    "remove duplicates",
    "filter",
    "filtered",
    "quality filter",
    "balanced",
    "class balance",
    "stratified",
    "train/val",
    "train/valid",
    "train/test",
    "validation set",
    "evaluation set",
    "data cleaning",
    "preprocessing",
];

const TRAINING_DATA_HEADINGS: [&str; 7] = [
    "training data",
    "pre-training data",
    "pretraining data",
    "pre training data",
    "pre-trained on",
    "data",
    "corpus",
];

/// Provenance and hygiene of the data a model was trained on.
pub struct DatasetQuality {
    hub: Arc<dyn ModelHub>,
}

impl DatasetQuality {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }

    fn score(&self, artifact: &ArtifactDescriptor) -> Option<Score> {
        let model_id = hub::model_id(&artifact.source_url)?;
        let readme = fetch_readme(self.hub.as_ref(), &model_id, self.key()).unwrap_or_default();
        if readme.trim().is_empty() {
            return Some(0.0);
        }
        let mut declared = self
            .hub
            .model_info(&model_id)
            .map(|info| info.declared_datasets())
            .unwrap_or_default();
        if let Some(linked) = artifact.dataset_url.as_deref().map(linked_dataset) {
            if !linked.is_empty() && !declared.contains(&linked) {
                declared.push(linked);
            }
        }
        Some(score_readme(&readme, &declared))
    }
}

impl Metric for DatasetQuality {
    fn key(&self) -> &str {
        "dataset_quality"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| self.score(artifact)))
    }
}

/// Dataset name from a linked dataset URL, in the card's lowercase form.
fn linked_dataset(url: &str) -> String {
    display_name(url).to_lowercase()
}

/// The README section describing training data, if it has one.
fn data_section(readme: &str) -> Option<&str> {
    find_section(readme, |title| {
        title_starts_with_word(title, "dataset") || title_starts_with_word(title, "datasets")
    })
    .or_else(|| {
        find_section(readme, |title| {
            TRAINING_DATA_HEADINGS
                .iter()
                .any(|heading| title_starts_with_word(title, heading))
        })
    })
}

pub fn score_readme(readme: &str, declared: &[String]) -> Score {
    let section = data_section(readme);
    let text = section.unwrap_or(readme).to_lowercase();

    let found: Vec<&str> = TRUSTED_DATASETS
        .iter()
        .copied()
        .filter(|name| text.contains(name) || declared.iter().any(|d| d == name))
        .collect();
    let hits = HYGIENE_KEYWORDS
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .count();
    let q = (hits as f64 / 4.0).min(1.0);

    let score = if found.contains(&"bookcorpus") && found.contains(&"wikipedia") {
        (0.95 + 0.05 * q).min(1.0)
    } else if found.len() >= 2 {
        (0.8 + 0.15 * q).min(0.95)
    } else if found.len() == 1 {
        (0.6 + 0.3 * q).min(0.9)
    } else if !declared.is_empty() || section.is_some() {
        (0.4 + 0.3 * q).min(0.7)
    } else {
        0.0
    };
    round3(score)
}
