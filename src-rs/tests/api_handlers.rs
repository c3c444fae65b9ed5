use std::sync::Arc;
use std::thread;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hyperos_agent_rs::api::handlers::{
    handle_cancel, handle_execute, handle_health, handle_status, handle_task_audit, handle_tasks,
    ExecuteRequest, TasksQuery,
};
use hyperos_agent_rs::test_support::{
    click, controller, done, test_config, type_text, GatedExecutor, RecordingExecutor, ScriptedOracle,
};
use hyperos_agent_rs::TaskController;

fn scripted(script: Vec<hyperos_agent_rs::oracle::Decision>) -> Arc<TaskController> {
    Arc::new(controller(
        test_config(),
        Arc::new(ScriptedOracle::new(script)),
        Arc::new(RecordingExecutor::new()),
    ))
}

fn request(task: &str) -> Result<Json<ExecuteRequest>, axum::extract::rejection::JsonRejection> {
    Ok(Json(ExecuteRequest {
        task: task.to_string(),
    }))
}

#[tokio::test]
async fn execute_returns_history_and_status_label() {
    let ctrl = scripted(vec![click(500, 300), type_text("hello"), done("typed greeting")]);

    let Json(response) = handle_execute(State(ctrl.clone()), request("say hello")).await.unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(response.steps_completed, 3);
    assert_eq!(response.message.as_deref(), Some("typed greeting"));

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["stepsCompleted"], 3);
    assert_eq!(body["taskId"], response.task_id.as_str());
    assert_eq!(body["history"][0]["step"], 1);
    assert_eq!(body["history"][0]["action"], "click");
    assert_eq!(body["history"][1]["parameters"]["text"], "hello");
    assert_eq!(body["history"][2]["done"], true);
}

#[tokio::test]
async fn safety_failure_is_a_normal_response() {
    let ctrl = scripted(vec![click(5, 5)]);

    let Json(response) = handle_execute(State(ctrl), request("click the corner")).await.unwrap();

    assert_eq!(response.status, "error");
    assert!(response.message.unwrap().starts_with("Safety violation"));
    assert_eq!(response.steps_completed, 1);
}

#[tokio::test]
async fn invalid_description_is_bad_request() {
    let ctrl = scripted(vec![done("ok")]);

    let err = handle_execute(State(ctrl.clone()), request("   ")).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    let err = handle_execute(State(ctrl), request(&"x".repeat(1001))).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn busy_controller_answers_conflict() {
    let (executor, gate) = GatedExecutor::new(1);
    let ctrl = Arc::new(controller(
        test_config(),
        Arc::new(ScriptedOracle::new(vec![click(500, 300), done("finished")])),
        Arc::new(executor),
    ));
    let runner = {
        let ctrl = ctrl.clone();
        thread::spawn(move || ctrl.submit("long task"))
    };
    gate.wait_reached();

    let Json(status) = handle_status(State(ctrl.clone())).await;
    assert_eq!(status["isRunning"], true);
    assert_eq!(status["currentTask"], "long task");

    let err = handle_execute(State(ctrl.clone()), request("another task")).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

    let Json(cancel) = handle_cancel(State(ctrl.clone())).await;
    assert!(cancel.success);

    gate.open();
    let report = runner.join().unwrap().unwrap();
    assert_eq!(report.status.label(), "cancelled");
}

#[tokio::test]
async fn cancel_without_running_task() {
    let ctrl = scripted(vec![done("ok")]);

    let Json(cancel) = handle_cancel(State(ctrl.clone())).await;
    assert!(!cancel.success);

    let Json(status) = handle_status(State(ctrl)).await;
    assert_eq!(status["isRunning"], false);
    assert!(status["currentTask"].is_null());
    assert_eq!(status["system"]["screenResolution"], "1920x1080");
}

#[tokio::test]
async fn health_lists_capabilities() {
    let ctrl = scripted(vec![done("ok")]);

    let Json(health) = handle_health(State(ctrl)).await;

    assert_eq!(health["status"], "HyperOS Agent Active");
    let capabilities = health["capabilities"].as_array().unwrap();
    assert!(capabilities.iter().any(|c| c == "safety_validation"));
}

#[tokio::test]
async fn tasks_and_audit_reflect_finished_runs() {
    let ctrl = scripted(vec![click(500, 300), done("first"), done("second")]);
    let Json(first) = handle_execute(State(ctrl.clone()), request("first")).await.unwrap();
    handle_execute(State(ctrl.clone()), request("second")).await.unwrap();

    let Json(tasks) = handle_tasks(State(ctrl.clone()), Query(TasksQuery { limit: Some(1) })).await;
    assert_eq!(tasks["tasks"].as_array().unwrap().len(), 1);
    let Json(tasks) = handle_tasks(State(ctrl.clone()), Query(TasksQuery::default())).await;
    assert_eq!(tasks["tasks"].as_array().unwrap().len(), 2);

    let Json(audit) = handle_task_audit(State(ctrl.clone()), Path(first.task_id.clone())).await;
    assert_eq!(audit["verified"], true);
    assert!(audit["error"].is_null());
    let records = audit["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["stepIndex"], 1);
    assert_eq!(records[1]["previousHash"], records[0]["contentHash"]);

    let Json(missing) = handle_task_audit(State(ctrl), Path("task_unknown".to_string())).await;
    assert_eq!(missing["records"].as_array().unwrap().len(), 0);
}
