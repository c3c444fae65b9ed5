use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub verbose: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ExecuteRequest {
    pub task: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub status: String,
    pub message: Option<String>,
    pub task_id: String,
    #[serde(default)]
    pub history: Vec<StepView>,
    pub steps_completed: usize,
}

#[derive(Debug, Deserialize)]
pub struct StepView {
    pub step: u32,
    #[serde(default)]
    pub thinking: String,
    pub action: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub done: bool,
    pub outcome: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_running: bool,
    pub current_task: Option<String>,
    #[serde(default)]
    pub system: Value,
}

#[derive(Debug, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub id: String,
    pub description: String,
    pub status: String,
    pub message: Option<String>,
    pub started_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
    pub task_id: String,
    pub verified: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub records: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "retryAfter")]
    pub retry_after: Option<u64>,
}
