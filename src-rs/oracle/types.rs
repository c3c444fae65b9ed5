use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::task::Step;

/// Raw oracle reply, before it is mapped onto an `ActionSpec`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub thinking: String,
    pub action: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub done: bool,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle unreachable: {0}")]
    Transport(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("oracle rate limited: {0}")]
    RateLimited(String),

    #[error("unparseable oracle reply: {0}")]
    Malformed(String),

    #[error("perception failed: {0}")]
    Perception(String),

    #[error("no API keys configured")]
    NoKeys,
}

/// Perceives the environment and proposes the next action.
///
/// Called synchronously from the step loop; implementations bound their own
/// latency.
pub trait DecisionOracle: Send + Sync {
    fn decide(&self, task: &str, history: &[Step]) -> Result<Decision, OracleError>;
}

/// Encoded snapshot of the environment attached to an oracle request.
#[derive(Clone, Debug)]
pub struct Frame {
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub trait FrameSource: Send + Sync {
    fn capture(&self) -> Result<Frame, String>;
}
