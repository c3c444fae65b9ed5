pub mod history;
pub mod store;
pub mod types;

pub use history::HistoryStore;
pub use store::{next_id, TaskStore};
pub use types::{Step, StepOutcome, Task, TaskStatus};
