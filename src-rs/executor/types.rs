use thiserror::Error;

use crate::action::ActionSpec;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExecutorError {
    #[error("{action} failed: {reason}")]
    Failed { action: String, reason: String },
}

/// Performs an approved action against the host environment.
///
/// The controller calls this at most once per step and never retries.
pub trait ActionExecutor: Send + Sync {
    fn perform(&self, action: &ActionSpec) -> Result<(), ExecutorError>;
}
