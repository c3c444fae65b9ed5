use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::audit::verify_records;
use crate::controller::TaskController;
use crate::result::TaskReport;
use crate::task::Step;

use super::error::ApiError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const CAPABILITIES: [&str; 6] = [
    "click_automation",
    "type_automation",
    "keyboard_control",
    "hotkey_control",
    "safety_validation",
    "audit_log",
];

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub task: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub status: String,
    pub message: Option<String>,
    pub task_id: String,
    pub history: Vec<Step>,
    pub steps_completed: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct TasksQuery {
    pub limit: Option<usize>,
}

pub fn system_status(controller: &TaskController) -> Value {
    let status = controller.status();
    let cfg = controller.config();
    json!({
        "os": std::env::consts::OS,
        "screenResolution": format!("{}x{}", cfg.screen_width, cfg.screen_height),
        "time": chrono::Local::now().format("%H:%M:%S").to_string(),
        "isRunning": status.is_running,
        "currentTask": status.current_task,
        "remainingSubmissions": controller.remaining_submissions(),
    })
}

pub async fn handle_health(State(controller): State<Arc<TaskController>>) -> Json<Value> {
    Json(json!({
        "status": "HyperOS Agent Active",
        "version": VERSION,
        "capabilities": CAPABILITIES,
        "system": system_status(&controller),
    }))
}

pub async fn handle_execute(
    State(controller): State<Arc<TaskController>>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    info!(task = %req.task, "received task");

    let result = tokio::task::spawn_blocking(move || controller.submit(&req.task)).await;
    match result {
        Ok(Ok(report)) => Ok(Json(to_response(report))),
        Ok(Err(err)) => Err(err.into()),
        Err(err) => {
            error!(error = %err, "task execution panicked");
            Err(ApiError::Internal(err.to_string()))
        }
    }
}

pub async fn handle_cancel(State(controller): State<Arc<TaskController>>) -> Json<CancelResponse> {
    let response = if controller.cancel() {
        CancelResponse {
            success: true,
            message: "Cancel request sent. Task will stop after current step.".to_string(),
        }
    } else {
        CancelResponse {
            success: false,
            message: "No task is currently running".to_string(),
        }
    };
    Json(response)
}

pub async fn handle_status(State(controller): State<Arc<TaskController>>) -> Json<Value> {
    let status = controller.status();
    Json(json!({
        "isRunning": status.is_running,
        "currentTask": status.current_task,
        "system": system_status(&controller),
    }))
}

pub async fn handle_tasks(
    State(controller): State<Arc<TaskController>>,
    Query(query): Query<TasksQuery>,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(10);
    Json(json!({"tasks": controller.tasks().list(limit)}))
}

pub async fn handle_task_audit(
    State(controller): State<Arc<TaskController>>,
    Path(task_id): Path<String>,
) -> Json<Value> {
    let records = controller.audit().read(&task_id);
    let verification = verify_records(&records);
    Json(json!({
        "taskId": task_id,
        "verified": verification.is_ok(),
        "error": verification.err().map(|err| err.to_string()),
        "records": records,
    }))
}

fn to_response(report: TaskReport) -> ExecuteResponse {
    ExecuteResponse {
        status: report.status.label().to_string(),
        message: report.message,
        task_id: report.task_id,
        history: report.history,
        steps_completed: report.steps_completed,
    }
}
