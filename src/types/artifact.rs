use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HF_DATASET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://huggingface\.co/datasets/[^/]+/[^/\s]+").expect("valid dataset regex")
});
static HF_MODEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://huggingface\.co/[^/]+/[^/\s]+").expect("valid model regex")
});
static GITHUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/[^/]+/[^/\s]+").expect("valid github regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Model,
    Dataset,
    Code,
}

impl ArtifactType {
    /// Infer the artifact category from its URL. Returns `None` for URLs the
    /// registry does not know how to rate.
    pub fn classify(url: &str) -> Option<Self> {
        let url = url.trim();
        if HF_DATASET_RE.is_match(url) {
            Some(Self::Dataset)
        } else if HF_MODEL_RE.is_match(url) {
            Some(Self::Model)
        } else if GITHUB_RE.is_match(url) {
            Some(Self::Code)
        } else {
            None
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            Self::Model => "MODEL",
            Self::Dataset => "DATASET",
            Self::Code => "CODE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub artifact_type: ArtifactType,
    pub source_url: String,
    pub name: String,
    pub code_url: Option<String>,
    pub dataset_url: Option<String>,
}

impl ArtifactDescriptor {
    pub fn new(artifact_type: ArtifactType, source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let name = display_name(&source_url);
        Self {
            artifact_type,
            source_url,
            name,
            code_url: None,
            dataset_url: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_code_url(mut self, url: Option<String>) -> Self {
        self.code_url = url.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_dataset_url(mut self, url: Option<String>) -> Self {
        self.dataset_url = url.filter(|value| !value.trim().is_empty());
        self
    }
}

/// Final repository segment of a URL or `owner/name` reference.
pub fn display_name(url: &str) -> String {
    let trimmed = url.trim();
    let path = match trimmed.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
        None => trimmed.strip_prefix("huggingface.co/").unwrap_or(trimmed),
    };
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let name = match parts.as_slice() {
        [] => "",
        [only] => *only,
        [first, second, ..] if !matches!(*first, "datasets" | "models" | "spaces") => *second,
        [_, second] => *second,
        [_, _, third, ..] => *third,
    };
    name.strip_suffix(".git").unwrap_or(name).to_string()
}
