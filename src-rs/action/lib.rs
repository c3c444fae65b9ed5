pub mod parse;
pub mod types;

pub use parse::{parse_action, ParseError};
pub use types::{ActionKind, ActionSpec};
