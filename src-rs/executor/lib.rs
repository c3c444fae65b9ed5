pub mod dry_run;
pub mod types;

pub use dry_run::DryRunExecutor;
pub use types::{ActionExecutor, ExecutorError};
