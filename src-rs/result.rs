use serde::Serialize;

use crate::task::{Step, TaskStatus};

/// Terminal outcome of one submitted task, with everything it recorded.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: Option<String>,
    pub history: Vec<Step>,
    pub steps_completed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStatus {
    pub is_running: bool,
    pub current_task: Option<String>,
}
