use super::markdown::{find_section, title_starts_with_word};
use super::{fetch_readme, timed_score, Metric};
use crate::error::Result;
use crate::fetch::{hub, ModelHub};
use crate::types::artifact::ArtifactDescriptor;
use crate::types::scoring::{MetricResult, Score};
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use std::sync::Arc;

static FRONT_MATTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*license\s*:\s*([^\r\n#]+)$").expect("valid front matter regex")
});
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_]+").expect("valid separator regex"));

static RESTRICTIVE: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\bagpl(?:-?3(?:\.0)?)?(?:-only|-or-later|\+)?\b",
        r"\bgpl(?:-?2(?:\.0)?|-?3(?:\.0)?)(?:-only|-or-later|\+)?\b",
        r"\bgplv[23]\b",
        r"\bcc-?by-?nc\b",
        r"\bcc-?nc\b",
        r"\bcc-?by-?nd\b",
        r"\bcc-?nd\b",
        r"\bnon-?commercial\b",
        r"\bresearch-?(?:only|use)\b",
        r"\bno-?derivatives?\b",
        r"\bproprietary\b",
        r"\bclosed-?source\b",
    ])
    .expect("valid restrictive license set")
});

static AMBIGUOUS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\bllama-?2\b",
        r"\bmeta-?llama\b",
        r"\bgemma\b",
        r"\btii-?falcon-?license\b",
        r"\bqwen-?license\b",
        r"\bopen-?rail(?:-[ml])?\b",
        r"\bcc-?by-?sa\b",
        r"\bshare-?alike\b",
        r"\blgpl-?3(?:\.0)?\b",
    ])
    .expect("valid ambiguous license set")
});

const PERMISSIVE_COMMON: [&str; 10] = [
    r"\bmit\b",
    r"\bapache-?(?:license-?)?(?:version-?)?2(?:\.0)?\b",
    r"\bapache2\b",
    r"\bbsd(?:-[23]-clause)?\b",
    r"\bmpl-?2(?:\.0)?\b",
    r"\blgpl-?2\.1(?:-only|-or-later|\+)?\b",
    r"\bcc-?by(?:-?4\.0)?\b",
    r"\bcc0\b",
    r"\bcreative-?commons-?zero\b",
    r"\bunlicense\b",
];

static PERMISSIVE: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(
        PERMISSIVE_COMMON
            .iter()
            .copied()
            .chain([r"\bmozilla-?public-?license-?2(?:\.0)?\b"]),
    )
    .expect("valid permissive license set")
});

/// Licenses the registry can redistribute. The spelled-out Mozilla form is
/// recognised as permissive but deliberately absent here.
static COMPATIBLE: Lazy<RegexSet> =
    Lazy::new(|| RegexSet::new(PERMISSIVE_COMMON).expect("valid compatible license set"));

/// Scores how freely a model's license allows reuse.
pub struct License {
    hub: Arc<dyn ModelHub>,
}

impl License {
    pub fn new(hub: Arc<dyn ModelHub>) -> Self {
        Self { hub }
    }

    fn score(&self, artifact: &ArtifactDescriptor) -> Option<Score> {
        let Some(model_id) = hub::model_id(&artifact.source_url) else {
            return Some(0.0);
        };
        let readme = fetch_readme(self.hub.as_ref(), &model_id, self.key()).ok()?;
        Some(score_readme(&readme))
    }
}

impl Metric for License {
    fn key(&self) -> &str {
        "license"
    }

    fn evaluate(&self, artifact: &ArtifactDescriptor) -> Result<MetricResult> {
        Ok(timed_score(|| self.score(artifact)))
    }
}

pub fn score_readme(readme: &str) -> Score {
    let text = readme.trim();
    if text.is_empty() {
        return 0.0;
    }
    classify(&license_span(text))
}

/// The part of the README that states the license, normalized to lowercase
/// with whitespace and underscores collapsed to `-`.
pub fn license_span(text: &str) -> String {
    let lower = text.to_lowercase();
    let span = match FRONT_MATTER_RE.captures(&lower).and_then(|caps| caps.get(1)) {
        Some(value) => value.as_str().trim().to_string(),
        None => find_section(text, |title| {
            title_starts_with_word(title, "license") || title_starts_with_word(title, "licensing")
        })
        .map(|body| body.trim().to_lowercase())
        .unwrap_or(lower),
    };
    SEPARATOR_RE.replace_all(&span, "-").into_owned()
}

/// First matching tier wins: restrictive, then ambiguous, then permissive.
pub fn classify(span: &str) -> Score {
    if RESTRICTIVE.is_match(span) {
        0.0
    } else if AMBIGUOUS.is_match(span) {
        0.5
    } else if PERMISSIVE.is_match(span) && COMPATIBLE.is_match(span) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fakes::FakeHub;

    fn score_text(text: &str) -> Score {
        classify(&license_span(text))
    }

    #[test]
    fn permissive_licenses_score_one() {
        assert_eq!(score_text("MIT License"), 1.0);
        assert_eq!(score_text("---\nlicense: apache-2.0\n---\n# Model"), 1.0);
        assert_eq!(score_text("Released under the BSD-3-Clause terms."), 1.0);
    }

    #[test]
    fn restrictive_licenses_score_zero() {
        assert_eq!(score_text("Licensed under GPLv3"), 0.0);
        assert_eq!(score_text("license: cc-by-nc-4.0"), 0.0);
        assert_eq!(score_text("For research only use."), 0.0);
    }

    #[test]
    fn no_derivatives_licenses_score_zero() {
        assert_eq!(score_text("---\nlicense: cc-by-nd-4.0\n---\n# Model"), 0.0);
        assert_eq!(score_text("Licensed under Creative Commons CC BY-ND 4.0"), 0.0);
        assert_eq!(score_text("license: cc-nd"), 0.0);
        assert_eq!(score_text("license: cc-by-4.0"), 1.0);
    }

    #[test]
    fn ambiguous_licenses_score_half() {
        assert_eq!(score_text("OpenRAIL"), 0.5);
        assert_eq!(score_text("license: llama2"), 0.5);
        assert_eq!(score_text("license: cc-by-sa-4.0"), 0.5);
    }

    #[test]
    fn spelled_out_mozilla_is_not_compatible() {
        assert_eq!(score_text("Mozilla Public License 2.0"), 0.0);
        assert_eq!(score_text("license: mpl-2.0"), 1.0);
    }

    #[test]
    fn no_license_text_scores_zero() {
        assert_eq!(score_text("A model that does things."), 0.0);
        assert_eq!(score_readme("   \n"), 0.0);
    }

    #[test]
    fn license_section_is_preferred_over_body() {
        let readme = "\
# Model
Compare with GPL-3.0 baselines.

## License
MIT

## Citation
none
";
        assert_eq!(license_span(readme), "mit");
        assert_eq!(score_readme(readme), 1.0);
    }

    #[test]
    fn evaluate_handles_missing_id_and_transport_errors() {
        let metric = License::new(Arc::new(FakeHub::default()));
        let code = ArtifactDescriptor::new(
            crate::types::artifact::ArtifactType::Code,
            "https://github.com/google-research/bert",
        );
        let result = metric.evaluate(&code).expect("license should evaluate");
        assert_eq!(result.score, Some(0.0));

        let model = ArtifactDescriptor::new(
            crate::types::artifact::ArtifactType::Model,
            "https://huggingface.co/google/gemma-3-270m",
        );
        let result = metric.evaluate(&model).expect("license should evaluate");
        assert_eq!(result.score, None);
    }

    #[test]
    fn evaluate_reads_readme_from_hub() {
        let hub = FakeHub {
            readme: Some("---\nlicense: mit\n---\n".to_string()),
            ..FakeHub::default()
        };
        let metric = License::new(Arc::new(hub));
        let model = ArtifactDescriptor::new(
            crate::types::artifact::ArtifactType::Model,
            "https://huggingface.co/org/model",
        );
        assert_eq!(
            metric.evaluate(&model).expect("license should evaluate").score,
            Some(1.0)
        );
    }
}
