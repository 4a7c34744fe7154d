//! Finds the code and dataset links a model card points at, so every scorer
//! sees them, not just the ones that scrape the README themselves.

use crate::fetch::{hub, ChatJudge, ModelHub, RepoRef};
use crate::types::artifact::{ArtifactDescriptor, ArtifactType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static HF_DATASET_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://huggingface\.co/datasets/[A-Za-z0-9_.-]+(?:/[A-Za-z0-9_.-]+)?")
        .expect("valid dataset link regex")
});

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Links {
    pub code_url: Option<String>,
    pub dataset_url: Option<String>,
}

/// Fills missing `code_url` / `dataset_url` on model descriptors. Explicit
/// links always win; the judge is asked next and plain README links are the
/// fallback for whatever it could not name.
pub struct LinkResolver {
    hub: Arc<dyn ModelHub>,
    judge: Arc<dyn ChatJudge>,
}

impl LinkResolver {
    pub fn new(hub: Arc<dyn ModelHub>, judge: Arc<dyn ChatJudge>) -> Self {
        Self { hub, judge }
    }

    pub fn resolve(&self, artifact: &ArtifactDescriptor) -> ArtifactDescriptor {
        let mut resolved = artifact.clone();
        if artifact.artifact_type != ArtifactType::Model
            || (artifact.code_url.is_some() && artifact.dataset_url.is_some())
        {
            return resolved;
        }
        let Some(model_id) = hub::model_id(&artifact.source_url) else {
            return resolved;
        };
        let readme = match self.hub.readme(&model_id) {
            Ok(readme) if !readme.trim().is_empty() => readme,
            Ok(_) => return resolved,
            Err(err) => {
                tracing::debug!(model = %model_id, error = %err, "readme unavailable for link lookup");
                return resolved;
            }
        };

        let asked = match self.judge.complete(&build_prompt(&readme)) {
            Ok(reply) => parse_reply(&reply),
            Err(err) => {
                tracing::debug!(model = %model_id, error = %err, "judge unavailable for link lookup");
                Links::default()
            }
        };
        let scraped = scrape_readme(&readme);

        if resolved.code_url.is_none() {
            resolved.code_url = asked.code_url.or(scraped.code_url);
        }
        if resolved.dataset_url.is_none() {
            resolved.dataset_url = asked.dataset_url.or(scraped.dataset_url);
        }
        tracing::debug!(
            model = %model_id,
            code_url = ?resolved.code_url,
            dataset_url = ?resolved.dataset_url,
            "links resolved"
        );
        resolved
    }
}

pub fn build_prompt(readme: &str) -> String {
    format!(
        "You match Hugging Face models to their code and datasets.\n\
         From the README below, find the URL of the GitHub repository holding this model's code \
         (use the repository root) and the URL of the dataset it was trained on.\n\
         Reply with exactly one line in the form: code_url, dataset_url\n\
         Write NULL for anything you cannot find. Add no labels and no other text.\n\n\
         README:\n{readme}"
    )
}

/// Reads `code_url, dataset_url` from the first non-empty line of a reply.
/// `NULL` and anything that is not an http(s) URL count as missing.
pub fn parse_reply(reply: &str) -> Links {
    let Some(line) = reply.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return Links::default();
    };
    let mut parts = line.splitn(2, ',').map(clean_url);
    Links {
        code_url: parts.next().flatten(),
        dataset_url: parts.next().flatten(),
    }
}

fn clean_url(raw: &str) -> Option<String> {
    let url = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '<' | '>'))
        .trim_end_matches(['.', ')', ';']);
    (url.starts_with("https://") || url.starts_with("http://")).then(|| url.to_string())
}

/// First GitHub repository and first hub dataset linked anywhere in the text.
pub fn scrape_readme(readme: &str) -> Links {
    Links {
        code_url: RepoRef::find_in(readme).map(|repo| format!("https://github.com/{repo}")),
        dataset_url: HF_DATASET_LINK_RE
            .find(readme)
            .map(|found| found.as_str().trim_end_matches('.').to_string()),
    }
}
