use super::{ensure_success, http_client, ModelHub, ModelInfo};
use crate::error::Result;
use crate::types::config::HubConfig;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};

const NON_REPO_SEGMENTS: [&str; 6] = ["tree", "blob", "resolve", "commits", "discussions", "files"];

/// Normalize a hub model reference to `owner/name` (or a bare `name`).
///
/// Accepts full `https://huggingface.co/...` URLs (including `tree/main`
/// style suffixes), `hf://owner/name` and plain ids. Dataset URLs and URLs
/// on other hosts yield `None`.
pub fn model_id(url: &str) -> Option<String> {
    let s = url.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(tail) = s.strip_prefix("hf://") {
        let parts: Vec<&str> = tail.split('/').filter(|part| !part.is_empty()).collect();
        return match parts.as_slice() {
            [] => None,
            [name] => Some(name.to_string()),
            [owner, name, ..] => Some(format!("{owner}/{name}")),
        };
    }

    let Some((_, rest)) = s.split_once("://") else {
        return Some(s.to_string());
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    if !host.ends_with("huggingface.co") {
        return None;
    }

    let parts: Vec<&str> = path
        .split(['/', '?', '#'])
        .filter(|part| !part.is_empty())
        .take_while(|part| !NON_REPO_SEGMENTS.contains(part))
        .collect();
    match parts.as_slice() {
        [] => None,
        ["datasets", ..] | ["spaces", ..] => None,
        [name] => Some(name.to_string()),
        [owner, name, ..] => Some(format!("{owner}/{name}")),
    }
}

/// Total object size from a `Content-Range: bytes 0-0/12345` header.
pub fn content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.split_once('/')?;
    total.trim().parse().ok()
}

pub struct HttpModelHub {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpModelHub {
    pub fn new(cfg: &HubConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(cfg.timeout())?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!(%url, "hub GET");
        let response = ensure_success(self.client.get(url).send()?)?;
        Ok(response.text()?)
    }

    fn resolve_url(&self, model_id: &str, revision: &str, path: &str) -> String {
        format!("{}/{model_id}/resolve/{revision}/{path}", self.base_url)
    }
}

impl ModelHub for HttpModelHub {
    fn model_info(&self, model_id: &str) -> Result<ModelInfo> {
        let url = format!("{}/api/models/{model_id}", self.base_url);
        tracing::debug!(%url, "hub GET");
        let response = ensure_success(self.client.get(&url).send()?)?;
        Ok(response.json()?)
    }

    fn readme(&self, model_id: &str) -> Result<String> {
        self.raw_file(model_id, "README.md")
    }

    fn raw_file(&self, model_id: &str, path: &str) -> Result<String> {
        self.get_text(&format!("{}/{model_id}/raw/main/{path}", self.base_url))
    }

    fn file_size(&self, model_id: &str, revision: &str, path: &str) -> Result<Option<u64>> {
        let url = self.resolve_url(model_id, revision, path);

        let direct = self
            .client
            .head(&url)
            .send()
            .ok()
            .filter(|response| response.status().is_success())
            .and_then(|response| {
                response
                    .headers()
                    .get(CONTENT_LENGTH)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<u64>().ok())
            })
            .filter(|size| *size > 0);
        if direct.is_some() {
            return Ok(direct);
        }

        tracing::debug!(%url, "content length unavailable, probing byte range");
        let response = self.client.get(&url).header(RANGE, "bytes=0-0").send()?;
        Ok(response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(content_range_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_normalizes_hub_urls() {
        assert_eq!(
            model_id("https://huggingface.co/google/gemma-3-270m").as_deref(),
            Some("google/gemma-3-270m")
        );
        assert_eq!(
            model_id("https://huggingface.co/google/gemma-3-270m/tree/main").as_deref(),
            Some("google/gemma-3-270m")
        );
        assert_eq!(
            model_id("https://huggingface.co/bert-base-uncased").as_deref(),
            Some("bert-base-uncased")
        );
        assert_eq!(model_id("hf://google/gemma").as_deref(), Some("google/gemma"));
        assert_eq!(model_id("google/gemma").as_deref(), Some("google/gemma"));
    }

    #[test]
    fn model_id_rejects_datasets_and_foreign_hosts() {
        assert_eq!(model_id("https://huggingface.co/datasets/rajpurkar/squad"), None);
        assert_eq!(model_id("https://github.com/google-research/bert"), None);
        assert_eq!(model_id("   "), None);
    }

    #[test]
    fn content_range_total_reads_size_after_slash() {
        assert_eq!(content_range_total("bytes 0-0/524288000"), Some(524_288_000));
        assert_eq!(content_range_total("bytes 0-0/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }
}
