use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{AuditView, CancelResponse, ErrorBody, ExecuteRequest, ExecuteResponse, StatusResponse, TaskInfo};

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn execute(&self, task: &str) -> Result<ExecuteResponse, String> {
        let req = ExecuteRequest {
            task: task.to_string(),
        };
        let resp = self
            .client
            .post(self.url("/execute"))
            .json(&req)
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    pub fn cancel(&self) -> Result<CancelResponse, String> {
        let resp = self
            .client
            .post(self.url("/cancel"))
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    pub fn status(&self) -> Result<StatusResponse, String> {
        self.get("/status")
    }

    pub fn health(&self) -> Result<Value, String> {
        self.get("/")
    }

    pub fn list_tasks(&self, limit: usize) -> Result<Vec<TaskInfo>, String> {
        let value: Value = self.get(&format!("/tasks?limit={}", limit))?;
        let tasks = value
            .get("tasks")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(tasks
            .into_iter()
            .filter_map(|item| serde_json::from_value::<TaskInfo>(item).ok())
            .collect())
    }

    pub fn audit(&self, task_id: &str) -> Result<AuditView, String> {
        self.get(&format!("/tasks/{}/audit", task_id))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    if resp.status().is_success() {
        return resp.json::<T>().map_err(|err| err.to_string());
    }
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            message,
            retry_after: Some(secs),
        }) => Err(format!("http {}: {} (retry in {}s)", status.as_u16(), message, secs)),
        Ok(ErrorBody { message, .. }) => Err(format!("http {}: {}", status.as_u16(), message)),
        Err(_) => Err(format!("http {}: {}", status.as_u16(), body)),
    }
}
