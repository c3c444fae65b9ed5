use std::io::{self, Write};

use serde_json::Value;

use crate::models::{AuditView, CLIConfig, CancelResponse, ExecuteResponse, StatusResponse, StepView, TaskInfo};

pub fn banner(cfg: &CLIConfig) {
    println!("HyperOS Agent Debug CLI");
    println!("API: {}", cfg.base_url);
    println!("Type a task to run it, or /help for commands.");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn help() {
    println!("Commands:");
    println!("  /help                  Show commands");
    println!("  /exit | /quit          Exit");
    println!("  /health                Show agent banner and capabilities");
    println!("  /status                Show whether a task is running");
    println!("  /cancel                Cancel the running task");
    println!("  /tasks [limit]         List recent tasks");
    println!("  /audit <task id>       Show the audit trail of a task");
    println!("  /verbose [on|off]      Toggle per-step output");
    println!("  /config                Show current config");
    println!("  /base <url>            Update base URL");
}

pub fn execution(resp: &ExecuteResponse, verbose: bool) {
    println!(
        "[{}] {} after {} step(s)",
        resp.status, resp.task_id, resp.steps_completed
    );
    if let Some(message) = &resp.message {
        println!("  {}", message);
    }
    if verbose {
        for step in &resp.history {
            self::step(step);
        }
    }
}

fn step(step: &StepView) {
    let outcome = step
        .outcome
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    println!("  {:>3}. {} {} -> {}", step.step, step.action, step.parameters, outcome);
    if let Some(reason) = step.outcome.get("reason").and_then(Value::as_str) {
        println!("       reason: {}", reason);
    }
    if !step.thinking.is_empty() {
        println!("       thinking: {}", step.thinking);
    }
    if step.done {
        println!("       (done)");
    }
}

pub fn status(status: &StatusResponse) {
    match &status.current_task {
        Some(task) if status.is_running => println!("running: {}", task),
        _ => println!("idle"),
    }
    if !status.system.is_null() {
        println!("system: {}", status.system);
    }
}

pub fn cancel(resp: &CancelResponse) {
    let marker = if resp.success { "ok" } else { "noop" };
    println!("[{}] {}", marker, resp.message);
}

pub fn tasks(tasks: &[TaskInfo]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for task in tasks {
        println!("[{}] {} {} - {}", task.status, task.started_at, task.id, task.description);
        if let Some(message) = &task.message {
            println!("    {}", message);
        }
    }
}

pub fn audit(view: &AuditView) {
    let integrity = if view.verified { "verified" } else { "BROKEN" };
    println!("audit {} ({} records, {})", view.task_id, view.records.len(), integrity);
    if let Some(err) = &view.error {
        println!("  {}", err);
    }
    for record in &view.records {
        println!(
            "  step {} {} {} {} {}",
            record["stepIndex"], record["action"], record["parameters"], record["outcome"], record["contentHash"]
        );
    }
}

pub fn json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

pub fn config(cfg: &CLIConfig) {
    println!("config:");
    println!("  base: {}", cfg.base_url);
    println!("  verbose: {}", cfg.verbose);
    println!("  timeout: {}s", cfg.timeout_secs);
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}
