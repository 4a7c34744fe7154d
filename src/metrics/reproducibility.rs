use super::{fetch_readme, timed_score, Metric};
use crate::error::Result;
use crate::fetch::{hub, ChatJudge, ModelHub};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{MetricResult, Score};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static STATUS_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Final Response -- Status Code : (1(?:\.0)?|0\.5|0(?:\.0)?)(?:[^\d.]|\.(?:\D|$)|$)")
        .expect("valid status code regex")
});

/// Asks a chat judge whether the README's example code would run as written.
pub struct Reproducibility {
    hub: Arc<dyn ModelHub>,
    judge: Arc<dyn ChatJudge>,
}

impl Reproducibility {
    pub fn new(hub: Arc<dyn ModelHub>, judge: Arc<dyn ChatJudge>) -> Self {
        Self { hub, judge }
    }

    fn score(&self, artifact: &ArtifactDescriptor) -> Option<Score> {
        let model_id = hub::model_id(&artifact.source_url)?;
        let readme = fetch_readme(self.hub.as_ref(), &model_id, self.key()).ok()?;
        if readme.trim().is_empty() {
            return None;
        }
        match self.judge.complete(&build_prompt(&artifact.source_url, &readme)) {
            Ok(reply) => Some(status_code(&reply)),
            Err(err) => {
                tracing::debug!(model = %model_id, error = %err, "judge unavailable");
                None
            }
        }
    }
}

impl Metric for Reproducibility {
    fn key(&self) -> &str {
        "reproducibility"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| self.score(artifact)))
    }
}

pub fn build_prompt(source_url: &str, readme: &str) -> String {
    format!(
        "You are checking whether the example code in a model README for {source_url} runs as written.\n\
         Simulate running it in a clean environment where only libraries that the code imports \
         explicitly get installed. Do not invent errors that would not happen.\n\
         List any assumptions you make.\n\
         Answer 1 if the code works out of the box, 0.5 if it works after at most two fixes, \
         and 0 otherwise.\n\
         End your answer with exactly one line in the form \"Final Response -- Status Code : <1|0.5|0>\".\n\n\
         README:\n{readme}"
    )
}

/// The status code from the judge's final line; anything unrecognised is 0.0.
pub fn status_code(reply: &str) -> Score {
    STATUS_CODE_RE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .and_then(|code| code.as_str().parse().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fakes::{FakeHub, FakeJudge};
    use crate::types::artifact::ArtifactType;

    fn model() -> ArtifactDescriptor {
        ArtifactDescriptor::new(ArtifactType::Model, "https://huggingface.co/org/model")
    }

    fn hub_with_readme() -> FakeHub {
        FakeHub {
            readme: Some("```python\nfrom transformers import pipeline\n```".to_string()),
            ..FakeHub::default()
        }
    }

    #[test]
    fn status_code_accepts_only_known_values() {
        assert_eq!(status_code("Final Response -- Status Code : 1"), 1.0);
        assert_eq!(status_code("ok\nFinal Response -- Status Code : 0.5"), 0.5);
        assert_eq!(status_code("Final Response -- Status Code : 0.0"), 0.0);
        assert_eq!(status_code("Final Response -- Status Code : 7"), 0.0);
        assert_eq!(status_code("Final Response -- Status Code : 1.5"), 0.0);
        assert_eq!(status_code("Final Response -- Status Code : 1."), 1.0);
        assert_eq!(status_code("it works!"), 0.0);
    }

    #[test]
    fn evaluate_sends_readme_to_judge() {
        let judge = Arc::new(FakeJudge::replying(Some(
            "Assumed torch.\nFinal Response -- Status Code : 0.5",
        )));
        let metric = Reproducibility::new(Arc::new(hub_with_readme()), judge.clone());
        let result = metric.evaluate(&model()).expect("evaluate");
        assert_eq!(result.score, Some(0.5));

        let prompts = judge.prompts.lock().expect("lock should not be poisoned");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("from transformers import pipeline"));
        assert!(prompts[0].contains("Final Response -- Status Code"));
    }

    #[test]
    fn judge_failure_or_missing_readme_is_unknown() {
        let metric = Reproducibility::new(
            Arc::new(hub_with_readme()),
            Arc::new(FakeJudge::replying(None)),
        );
        assert_eq!(metric.evaluate(&model()).expect("evaluate").score, None);

        let metric = Reproducibility::new(
            Arc::new(FakeHub::default()),
            Arc::new(FakeJudge::replying(Some("Final Response -- Status Code : 1"))),
        );
        assert_eq!(metric.evaluate(&model()).expect("evaluate").score, None);
    }

    #[test]
    fn unparseable_reply_scores_zero() {
        let metric = Reproducibility::new(
            Arc::new(hub_with_readme()),
            Arc::new(FakeJudge::replying(Some("I could not decide."))),
        );
        assert_eq!(metric.evaluate(&model()).expect("evaluate").score, Some(0.0));
    }
}
