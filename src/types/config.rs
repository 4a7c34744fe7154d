use crate::error::RaterError;
use crate::runner::{DEFAULT_WORKERS, MAX_WORKERS};
use crate::types::scoring::{WeightTable, DEFAULT_WEIGHTS};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaterConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub weights: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub code_host: CodeHostConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Look up code and dataset links in the model card before rating.
    #[serde(default = "default_resolve_links")]
    pub resolve_links: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            resolve_links: default_resolve_links(),
        }
    }
}

fn default_resolve_links() -> bool {
    true
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_hub_base")]
    pub base_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: default_hub_base(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_hub_base() -> String {
    "https://huggingface.co".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeHostConfig {
    #[serde(default = "default_code_host_api")]
    pub api_base: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_max_pulls")]
    pub max_pulls: usize,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for CodeHostConfig {
    fn default() -> Self {
        Self {
            api_base: default_code_host_api(),
            token_env: default_token_env(),
            max_pulls: default_max_pulls(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_code_host_api() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_max_pulls() -> usize {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_judge_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_judge_model")]
    pub model: String,
    #[serde(default = "default_judge_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_judge_timeout")]
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_judge_endpoint(),
            model: default_judge_model(),
            api_key_env: default_judge_key_env(),
            timeout_secs: default_judge_timeout(),
        }
    }
}

fn default_judge_endpoint() -> String {
    "https://genai.rcac.purdue.edu/api/chat/completions".to_string()
}

fn default_judge_model() -> String {
    "llama3.3:70b".to_string()
}

fn default_judge_key_env() -> String {
    "GENAI_API_KEY".to_string()
}

fn default_judge_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_analyzer_program")]
    pub program: String,
    #[serde(default = "default_analyzer_args")]
    pub args: Vec<String>,
    #[serde(default = "default_analyzer_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: default_analyzer_program(),
            args: default_analyzer_args(),
            timeout_secs: default_analyzer_timeout(),
            max_files: default_max_files(),
        }
    }
}

fn default_analyzer_program() -> String {
    "python3".to_string()
}

fn default_analyzer_args() -> Vec<String> {
    ["-m", "pylint", "--output-format=text", "--score=yes"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_analyzer_timeout() -> u64 {
    30
}

fn default_max_files() -> usize {
    5
}

impl HubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CodeHostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl JudgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AnalyzerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RaterConfig {
    /// Default weights with any configured overrides applied, in registry order.
    pub fn weight_table(&self) -> Result<WeightTable, RaterError> {
        let entries = DEFAULT_WEIGHTS
            .iter()
            .map(|(key, default)| {
                let weight = self
                    .weights
                    .as_ref()
                    .and_then(|weights| weights.get(*key))
                    .copied()
                    .unwrap_or(*default);
                (key.to_string(), weight)
            })
            .collect();
        WeightTable::new(entries)
    }

    pub fn validate(&self) -> Result<(), RaterError> {
        if !(1..=MAX_WORKERS).contains(&self.engine.workers) {
            return Err(RaterError::ConfigParse(format!(
                "engine.workers must be between 1 and {MAX_WORKERS} (found {})",
                self.engine.workers
            )));
        }

        if let Some(weights) = &self.weights {
            let unknown = weights
                .keys()
                .filter(|key| !DEFAULT_WEIGHTS.iter().any(|(known, _)| known == key))
                .cloned()
                .collect::<Vec<_>>();
            if !unknown.is_empty() {
                return Err(RaterError::ConfigParse(format!(
                    "weights contains unknown key(s): {}",
                    unknown.join(", ")
                )));
            }
        }
        self.weight_table()?;

        for (name, secs) in [
            ("hub.timeout_secs", self.hub.timeout_secs),
            ("code_host.timeout_secs", self.code_host.timeout_secs),
            ("judge.timeout_secs", self.judge.timeout_secs),
            ("analyzer.timeout_secs", self.analyzer.timeout_secs),
        ] {
            if secs == 0 {
                return Err(RaterError::ConfigParse(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.code_host.max_pulls == 0 || self.code_host.max_pulls > 100 {
            return Err(RaterError::ConfigParse(
                "code_host.max_pulls must be between 1 and 100".to_string(),
            ));
        }
        if self.analyzer.max_files == 0 {
            return Err(RaterError::ConfigParse(
                "analyzer.max_files must be greater than 0".to_string(),
            ));
        }
        if self.analyzer.program.trim().is_empty() {
            return Err(RaterError::ConfigParse(
                "analyzer.program cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
