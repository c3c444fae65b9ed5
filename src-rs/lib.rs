pub mod config;
pub mod controller;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod result;

#[path = "action/lib.rs"]
pub mod action;
#[path = "safety/lib.rs"]
pub mod safety;
#[path = "audit/lib.rs"]
pub mod audit;
#[path = "task/lib.rs"]
pub mod task;
#[path = "control/lib.rs"]
pub mod control;
#[path = "oracle/lib.rs"]
pub mod oracle;
#[path = "executor/lib.rs"]
pub mod executor;
#[path = "api/lib.rs"]
pub mod api;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::AgentConfig;
pub use controller::TaskController;
pub use error::{ConfigError, SubmitError};
pub use result::{ControllerStatus, TaskReport};
