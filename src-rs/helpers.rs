use std::env;
use std::sync::Arc;

use tracing::info;

use crate::audit::AuditLog;
use crate::config::AgentConfig;
use crate::controller::TaskController;
use crate::error::ConfigError;
use crate::executor::{ActionExecutor, DryRunExecutor};
use crate::oracle::{GeminiConfig, GeminiOracle};

fn load_keys_from_env(primary: &str, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Ok(raw) = env::var(primary) {
        keys.extend(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string),
        );
    }
    for idx in 2..=10 {
        if let Ok(value) = env::var(format!("{}_{}", prefix, idx)) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    keys
}

pub fn load_gemini_keys() -> Vec<String> {
    load_keys_from_env("GEMINI_API_KEY", "GEMINI_API_KEY")
}

pub fn build_oracle(cfg: &AgentConfig) -> Result<GeminiOracle, ConfigError> {
    GeminiOracle::new(GeminiConfig {
        api_keys: load_gemini_keys(),
        base_url: String::new(),
        model: cfg.gemini_model.clone(),
        temperature: cfg.temperature,
        screen_width: cfg.screen_width,
        screen_height: cfg.screen_height,
    })
}

pub fn open_audit_log(cfg: &AgentConfig) -> Result<AuditLog, ConfigError> {
    match &cfg.audit_log_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| crate::audit::AuditError::Open {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            info!(path = %path.display(), "audit log persisted to disk");
            Ok(AuditLog::open(path)?.with_memory_limit(cfg.audit_memory_limit))
        }
        None => Ok(AuditLog::in_memory().with_memory_limit(cfg.audit_memory_limit)),
    }
}

/// Wire the Gemini oracle and a dry-run executor into a controller.
pub fn build_controller(cfg: &AgentConfig) -> Result<TaskController, ConfigError> {
    let oracle = build_oracle(cfg)?;
    let executor: Arc<dyn ActionExecutor> = Arc::new(DryRunExecutor);
    let audit = open_audit_log(cfg)?;
    TaskController::new(cfg.clone(), Arc::new(oracle), executor, Arc::new(audit))
}
