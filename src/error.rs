use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaterError {
    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("duplicate metric key in registry: {0}")]
    DuplicateMetric(String),

    #[error("metric has no weight entry: {0}")]
    MissingWeight(String),

    #[error("metric panicked: {0}")]
    MetricPanicked(String),

    #[error("worker pool could not be built: {0}")]
    WorkerPool(String),

    #[error("upstream returned status {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("unsupported artifact: {0}")]
    UnsupportedArtifact(String),

    #[error("static analyzer failed: {0}")]
    Analyzer(String),

    #[error("judge response malformed: {0}")]
    JudgeResponse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RaterError>;
