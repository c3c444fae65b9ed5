use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::api::handlers::{
    handle_cancel, handle_execute, handle_health, handle_status, handle_task_audit, handle_tasks,
};
use crate::controller::TaskController;

pub fn router(controller: Arc<TaskController>) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/execute", post(handle_execute))
        .route("/cancel", post(handle_cancel))
        .route("/status", get(handle_status))
        .route("/tasks", get(handle_tasks))
        .route("/tasks/:id/audit", get(handle_task_audit))
        .with_state(controller)
}

pub struct AgentServer {
    pub addr: SocketAddr,
    pub controller: Arc<TaskController>,
}

impl AgentServer {
    pub fn new(addr: SocketAddr, controller: Arc<TaskController>) -> Self {
        Self { addr, controller }
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        let app = router(self.controller.clone());
        info!(addr = %self.addr, "agent server listening");
        axum::Server::bind(&self.addr)
            .serve(app.into_make_service())
            .await?;
        Ok(())
    }
}
