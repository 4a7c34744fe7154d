use super::{timed_score, Metric};
use crate::error::Result;
use crate::fetch::{hub, CodeHost, ModelHub, RepoRef};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{round3, MetricResult, Score};
use std::sync::Arc;

const BINARY_EXTENSIONS: [&str; 8] = [
    ".bin",
    ".safetensors",
    ".ckpt",
    ".pt",
    ".pth",
    ".onnx",
    ".h5",
    ".gguf",
];

/// Share of recently merged code that went through at least one review.
///
/// `None` means the repository could not be identified, had no merged pull
/// requests, or none of their details could be fetched. That is never
/// reported as 0.0.
pub struct Reviewedness {
    hub: Arc<dyn ModelHub>,
    code_host: Arc<dyn CodeHost>,
    max_pulls: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LineTally {
    reviewed: u64,
    total: u64,
}

impl Reviewedness {
    pub fn new(hub: Arc<dyn ModelHub>, code_host: Arc<dyn CodeHost>, max_pulls: usize) -> Self {
        Self {
            hub,
            code_host,
            max_pulls,
        }
    }

    /// Repository identity: explicit code link, then the source URL, then a
    /// link found in the model card.
    fn repository(&self, artifact: &ArtifactDescriptor) -> Option<RepoRef> {
        artifact
            .code_url
            .as_deref()
            .and_then(RepoRef::find_in)
            .or_else(|| RepoRef::find_in(&artifact.source_url))
            .or_else(|| {
                let model_id = hub::model_id(&artifact.source_url)?;
                let readme = self.hub.readme(&model_id).ok()?;
                RepoRef::find_in(&readme)
            })
    }

    fn score(&self, artifact: &ArtifactDescriptor) -> Option<Score> {
        let repo = self.repository(artifact)?;
        let pulls = match self.code_host.closed_pulls(&repo, self.max_pulls) {
            Ok(pulls) => pulls,
            Err(err) => {
                tracing::debug!(%repo, error = %err, "pull request listing failed");
                return None;
            }
        };

        let merged: Vec<u64> = pulls
            .iter()
            .filter(|pull| pull.merged_at.is_some())
            .map(|pull| pull.number)
            .collect();
        if merged.is_empty() {
            return None;
        }

        let tallies: Vec<LineTally> = merged
            .into_iter()
            .filter_map(|number| self.tally_pull(&repo, number))
            .collect();
        if tallies.is_empty() {
            tracing::debug!(%repo, "no merged pull request details could be fetched");
            return None;
        }
        let tally = tallies
            .into_iter()
            .fold(LineTally::default(), |acc, pull| LineTally {
                reviewed: acc.reviewed + pull.reviewed,
                total: acc.total + pull.total,
            });
        Some(ratio(tally))
    }

    fn tally_pull(&self, repo: &RepoRef, number: u64) -> Option<LineTally> {
        let reviewed = !self.code_host.pull_reviews(repo, number).ok()?.is_empty();
        let total = self
            .code_host
            .pull_files(repo, number)
            .ok()?
            .iter()
            .filter(|file| !is_binary(&file.filename))
            .map(|file| file.additions)
            .sum();
        Some(LineTally {
            reviewed: if reviewed { total } else { 0 },
            total,
        })
    }
}

impl Metric for Reviewedness {
    fn key(&self) -> &str {
        "reviewedness"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| self.score(artifact)))
    }
}

fn is_binary(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn ratio(tally: LineTally) -> Score {
    if tally.total == 0 {
        0.0
    } else {
        round3(tally.reviewed as f64 / tally.total as f64)
    }
}
