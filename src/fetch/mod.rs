//! Repository metadata fetching.
//!
//! Every remote collaborator a scorer talks to sits behind a trait so the
//! scorers can be exercised against canned data. The HTTP and subprocess
//! implementations live next to each trait and are wired together by
//! [`Services::from_config`].

pub mod analyzer;
pub mod github;
pub mod hub;
pub mod judge;

use crate::error::Result;
use crate::types::config::RaterConfig;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub use github::RepoRef;

const USER_AGENT: &str = concat!("artifact-rater/", env!("CARGO_PKG_VERSION"));

/// Model metadata as returned by the hub's `api/models/{id}` endpoint.
/// Every field is optional; scorers fall back to zero-signal defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub sha: Option<String>,
    pub siblings: Option<Vec<Sibling>>,
    pub downloads: Option<Value>,
    pub likes: Option<Value>,
    pub last_modified: Option<String>,
    pub card_data: Option<Value>,
    pub tags: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sibling {
    pub rfilename: Option<String>,
}

impl ModelInfo {
    pub fn file_names(&self) -> Vec<&str> {
        self.siblings
            .iter()
            .flatten()
            .filter_map(|sibling| sibling.rfilename.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn downloads(&self) -> u64 {
        self.downloads.as_ref().map(lenient_count).unwrap_or(0)
    }

    pub fn likes(&self) -> u64 {
        self.likes.as_ref().map(lenient_count).unwrap_or(0)
    }

    pub fn has_card(&self) -> bool {
        match &self.card_data {
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    /// Lowercased dataset names declared in the model card.
    pub fn declared_datasets(&self) -> Vec<String> {
        let Some(datasets) = self.card_data.as_ref().and_then(|card| card.get("datasets")) else {
            return Vec::new();
        };
        match datasets {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
            Value::String(name) if !name.trim().is_empty() => vec![name.trim().to_lowercase()],
            _ => Vec::new(),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect()
    }
}

/// Counts may arrive as numbers or numeric strings; anything else is zero.
fn lenient_count(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    pub merged_at: Option<String>,
}

/// A submitted review. Only its presence counts, so every field is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Review {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub additions: u64,
}

pub trait ModelHub: Send + Sync {
    fn model_info(&self, model_id: &str) -> Result<ModelInfo>;
    fn readme(&self, model_id: &str) -> Result<String>;
    fn raw_file(&self, model_id: &str, path: &str) -> Result<String>;
    /// Byte size of a repository file at `revision`, `None` when the hub
    /// does not disclose it.
    fn file_size(&self, model_id: &str, revision: &str, path: &str) -> Result<Option<u64>>;
}

pub trait CodeHost: Send + Sync {
    fn closed_pulls(&self, repo: &RepoRef, limit: usize) -> Result<Vec<PullSummary>>;
    fn pull_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<Review>>;
    fn pull_files(&self, repo: &RepoRef, number: u64) -> Result<Vec<PullFile>>;
}

pub trait ChatJudge: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

pub trait StaticAnalyzer: Send + Sync {
    /// Raw numeric rating of a source file, `None` when the tool printed none.
    fn rate(&self, source: &str, file_name: &str) -> Result<Option<f64>>;
}

/// Shared handles to every external collaborator.
#[derive(Clone)]
pub struct Services {
    pub hub: Arc<dyn ModelHub>,
    pub code_host: Arc<dyn CodeHost>,
    pub judge: Arc<dyn ChatJudge>,
    pub analyzer: Arc<dyn StaticAnalyzer>,
    pub max_pulls: usize,
    pub max_source_files: usize,
}

impl Services {
    pub fn from_config(cfg: &RaterConfig) -> Result<Self> {
        Ok(Self {
            hub: Arc::new(hub::HttpModelHub::new(&cfg.hub)?),
            code_host: Arc::new(github::HttpCodeHost::new(&cfg.code_host)?),
            judge: Arc::new(judge::HttpChatJudge::new(&cfg.judge)?),
            analyzer: Arc::new(analyzer::PylintAnalyzer::new(&cfg.analyzer)),
            max_pulls: cfg.code_host.max_pulls,
            max_source_files: cfg.analyzer.max_files,
        })
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5).min(timeout))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

pub(crate) fn ensure_success(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(crate::error::RaterError::UpstreamStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[cfg(test)]
pub mod fakes {
    //! In-memory collaborators for scorer tests.

    use super::*;
    use crate::error::RaterError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn missing(what: &str) -> RaterError {
        RaterError::UpstreamStatus {
            status: 404,
            url: what.to_string(),
        }
    }

    #[derive(Default)]
    pub struct FakeHub {
        pub info: Option<ModelInfo>,
        pub readme: Option<String>,
        pub files: HashMap<String, String>,
        pub sizes: HashMap<String, u64>,
    }

    impl ModelHub for FakeHub {
        fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
            self.info.clone().ok_or_else(|| missing(model_id))
        }

        fn readme(&self, model_id: &str) -> Result<String> {
            self.readme.clone().ok_or_else(|| missing(model_id))
        }

        fn raw_file(&self, _model_id: &str, path: &str) -> Result<String> {
            self.files.get(path).cloned().ok_or_else(|| missing(path))
        }

        fn file_size(&self, _model_id: &str, _revision: &str, path: &str) -> Result<Option<u64>> {
            Ok(self.sizes.get(path).copied())
        }
    }

    pub struct FakePull {
        pub number: u64,
        pub merged: bool,
        pub reviews: usize,
        pub files: Vec<(&'static str, u64)>,
    }

    #[derive(Default)]
    pub struct FakeCodeHost {
        pub pulls: Option<Vec<FakePull>>,
        /// Per-PR review and file calls fail while the listing succeeds.
        pub details_fail: bool,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeCodeHost {
        fn pull(&self, number: u64) -> Result<&FakePull> {
            if self.details_fail {
                return Err(RaterError::UpstreamStatus {
                    status: 403,
                    url: format!("pulls/{number}"),
                });
            }
            self.pulls
                .iter()
                .flatten()
                .find(|pull| pull.number == number)
                .ok_or_else(|| missing("pull"))
        }
    }

    impl CodeHost for FakeCodeHost {
        fn closed_pulls(&self, repo: &RepoRef, limit: usize) -> Result<Vec<PullSummary>> {
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(repo.to_string());
            }
            let pulls = self.pulls.as_ref().ok_or_else(|| missing("pulls"))?;
            Ok(pulls
                .iter()
                .take(limit)
                .map(|pull| PullSummary {
                    number: pull.number,
                    merged_at: pull.merged.then(|| "2024-05-01T00:00:00Z".to_string()),
                })
                .collect())
        }

        fn pull_reviews(&self, _repo: &RepoRef, number: u64) -> Result<Vec<Review>> {
            let pull = self.pull(number)?;
            Ok((0..pull.reviews).map(|_| Review::default()).collect())
        }

        fn pull_files(&self, _repo: &RepoRef, number: u64) -> Result<Vec<PullFile>> {
            let pull = self.pull(number)?;
            Ok(pull
                .files
                .iter()
                .map(|(filename, additions)| PullFile {
                    filename: filename.to_string(),
                    additions: *additions,
                })
                .collect())
        }
    }

    pub struct FakeJudge {
        pub reply: Option<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeJudge {
        pub fn replying(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(ToString::to_string),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatJudge for FakeJudge {
        fn complete(&self, prompt: &str) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.reply.clone().ok_or_else(|| missing("judge"))
        }
    }

    #[derive(Default)]
    pub struct FakeAnalyzer {
        pub ratings: HashMap<String, f64>,
    }

    impl StaticAnalyzer for FakeAnalyzer {
        fn rate(&self, _source: &str, file_name: &str) -> Result<Option<f64>> {
            Ok(self.ratings.get(file_name).copied())
        }
    }

    pub fn services(
        hub: FakeHub,
        code_host: FakeCodeHost,
        judge: FakeJudge,
        analyzer: FakeAnalyzer,
    ) -> Services {
        Services {
            hub: Arc::new(hub),
            code_host: Arc::new(code_host),
            judge: Arc::new(judge),
            analyzer: Arc::new(analyzer),
            max_pulls: 30,
            max_source_files: 5,
        }
    }

    pub fn siblings(names: &[&str]) -> Option<Vec<Sibling>> {
        Some(
            names
                .iter()
                .map(|name| Sibling {
                    rfilename: Some(name.to_string()),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_info_tolerates_nulls_and_string_counts() {
        let info: ModelInfo = serde_json::from_value(json!({
            "sha": "abc",
            "siblings": null,
            "downloads": "1500",
            "likes": "many",
            "lastModified": "2024-01-01T00:00:00.000Z",
            "cardData": {"datasets": ["BookCorpus", "wikipedia"]},
            "tags": ["Example", 3]
        }))
        .expect("model info should parse");

        assert!(info.file_names().is_empty());
        assert_eq!(info.downloads(), 1500);
        assert_eq!(info.likes(), 0);
        assert!(info.has_card());
        assert_eq!(info.declared_datasets(), vec!["bookcorpus", "wikipedia"]);
        assert_eq!(info.tags(), vec!["example"]);
    }

    #[test]
    fn declared_datasets_accepts_single_string() {
        let info: ModelInfo = serde_json::from_value(json!({
            "cardData": {"datasets": "squad"}
        }))
        .expect("model info should parse");
        assert_eq!(info.declared_datasets(), vec!["squad"]);
    }

    #[test]
    fn empty_card_is_not_a_card() {
        let info: ModelInfo =
            serde_json::from_value(json!({"cardData": {}})).expect("model info should parse");
        assert!(!info.has_card());
        assert!(info.declared_datasets().is_empty());
    }

    #[test]
    fn reviews_parse_regardless_of_payload_fields() {
        let reviews: Vec<Review> = serde_json::from_value(json!([
            {"id": 1, "state": "APPROVED", "user": {"login": "octocat"}},
            {"state": "COMMENTED"}
        ]))
        .expect("reviews should parse");
        assert_eq!(reviews.len(), 2);
    }
}
