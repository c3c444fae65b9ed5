pub mod gemini_adapter;
pub mod rotation;
pub mod types;

pub use gemini_adapter::{GeminiConfig, GeminiOracle};
pub use rotation::Rotator;
pub use types::{Decision, DecisionOracle, Frame, FrameSource, OracleError};
