use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to open audit log at {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write audit record: {0}")]
    Write(#[from] std::io::Error),

    #[error("malformed audit record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit record {position} ({task_id}#{step_index}) failed verification: {detail}")]
    IntegrityViolation {
        position: usize,
        task_id: String,
        step_index: u32,
        detail: String,
    },

    #[error("audit log lock poisoned")]
    Poisoned,
}
