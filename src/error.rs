use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipemonError {
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("GitLab API returned {status}: {body}")]
    UpstreamRequestFailed { status: u16, body: String },

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipemonError>;
