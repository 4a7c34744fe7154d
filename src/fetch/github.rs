use super::{ensure_success, http_client, CodeHost, PullFile, PullSummary, Review};
use crate::error::Result;
use crate::types::config::CodeHostConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::fmt;

static REPO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)").expect("valid repo regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// First `github.com/owner/repo` reference found anywhere in `text`.
    pub fn find_in(text: &str) -> Option<Self> {
        REPO_RE.captures_iter(text).find_map(|captures| {
            let owner = captures.get(1)?.as_str();
            let name = captures.get(2)?.as_str();
            let name = name.strip_suffix(".git").unwrap_or(name);
            let name = name.trim_end_matches('.');
            if name.is_empty() || matches!(owner, "orgs" | "topics" | "features") {
                return None;
            }
            Some(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

pub struct HttpCodeHost {
    client: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
}

impl HttpCodeHost {
    pub fn new(cfg: &CodeHostConfig) -> Result<Self> {
        let token = std::env::var(&cfg.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty());
        Ok(Self {
            client: http_client(cfg.timeout())?,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(%url, "code host GET");
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = ensure_success(request.send()?)?;
        Ok(response.json()?)
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name)
    }
}

impl CodeHost for HttpCodeHost {
    fn closed_pulls(&self, repo: &RepoRef, limit: usize) -> Result<Vec<PullSummary>> {
        self.get_json(&format!(
            "{}/pulls?state=closed&sort=updated&direction=desc&per_page={limit}",
            self.repo_url(repo)
        ))
    }

    fn pull_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>> {
        self.get_json(&format!("{}/pulls/{number}/reviews", self.repo_url(repo)))
    }

    fn pull_files(&self, repo: &RepoRef, number: u64) -> Result<Vec<PullFile>> {
        self.get_json(&format!(
            "{}/pulls/{number}/files?per_page=100",
            self.repo_url(repo)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_in_extracts_owner_and_repo() {
        let repo = RepoRef::find_in("Code: https://github.com/google-research/bert.git for details")
            .expect("repo should be found");
        assert_eq!(repo.owner, "google-research");
        assert_eq!(repo.name, "bert");
        assert_eq!(repo.to_string(), "google-research/bert");
    }

    #[test]
    fn find_in_trims_sentence_punctuation() {
        let repo = RepoRef::find_in("See github.com/huggingface/transformers.")
            .expect("repo should be found");
        assert_eq!(repo.name, "transformers");
    }

    #[test]
    fn find_in_skips_non_repository_paths() {
        let repo = RepoRef::find_in("github.com/topics/nlp and github.com/openai/whisper")
            .expect("second link should be used");
        assert_eq!(repo.to_string(), "openai/whisper");
        assert!(RepoRef::find_in("no links here").is_none());
    }
}
