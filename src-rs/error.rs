use thiserror::Error;

use crate::audit::AuditError;

/// Rejections raised at the submission boundary. None of them creates a task.
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("invalid task: {0}")]
    Validation(String),

    #[error("another task is already in progress: {running}")]
    Conflict { running: String },

    #[error("rate limit exceeded, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("{key} must be within {min}..={max}, got {value}")]
    OutOfRange {
        key: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("invalid blocklist pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("no Gemini API key found (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Audit(#[from] AuditError),
}
