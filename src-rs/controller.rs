use std::sync::Arc;
use std::thread;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::action::{parse_action, ActionSpec};
use crate::audit::{AuditError, AuditLog, AuditOutcome, RecordDraft};
use crate::config::AgentConfig;
use crate::control::{CancellationToken, ConcurrencyGuard};
use crate::error::{ConfigError, SubmitError};
use crate::executor::ActionExecutor;
use crate::oracle::DecisionOracle;
use crate::result::{ControllerStatus, TaskReport};
use crate::safety::{SafetyValidator, SensitiveDataDetector, Verdict};
use crate::task::{next_id, HistoryStore, Step, StepOutcome, Task, TaskStatus, TaskStore};

struct LoopExit {
    status: TaskStatus,
    message: String,
}

impl LoopExit {
    fn new(status: TaskStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Runs tasks through the perceive → decide → validate → act loop.
///
/// `submit` blocks the calling thread until the task is terminal. `cancel`
/// and `status` may be called from other threads at any time and only touch
/// the concurrency guard's slot.
pub struct TaskController {
    config: AgentConfig,
    oracle: Arc<dyn DecisionOracle>,
    executor: Arc<dyn ActionExecutor>,
    validator: SafetyValidator,
    sensitive: SensitiveDataDetector,
    audit: Arc<AuditLog>,
    tasks: TaskStore,
    guard: ConcurrencyGuard,
    control_chars: Regex,
    whitespace: Regex,
}

impl TaskController {
    pub fn new(
        config: AgentConfig,
        oracle: Arc<dyn DecisionOracle>,
        executor: Arc<dyn ActionExecutor>,
        audit: Arc<AuditLog>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let validator = SafetyValidator::from_config(&config)?;
        let sensitive = SensitiveDataDetector::new()?;
        let tasks = TaskStore::with_capacity(config.max_retained_tasks);
        let control_chars = compile(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]")?;
        let whitespace = compile(r"\s+")?;
        Ok(Self {
            config,
            oracle,
            executor,
            validator,
            sensitive,
            audit,
            tasks,
            guard: ConcurrencyGuard::new(),
            control_chars,
            whitespace,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Validate, admit and run a task to completion.
    pub fn submit(&self, description: &str) -> Result<TaskReport, SubmitError> {
        let description = self.sanitize(description)?;

        let task_id = next_id();
        let lease = self
            .guard
            .try_acquire(&task_id, &description)
            .map_err(|running| SubmitError::Conflict { running })?;
        self.validator
            .admit_submission()
            .map_err(|retry_after_secs| SubmitError::RateLimited { retry_after_secs })?;

        let task = self.tasks.create_with_id(task_id, &description);
        info!(task_id = %task.id, description = %task.description, "task started");

        let (exit, history) = self.run_loop(&task, lease.token());
        let steps = history.into_steps();
        // Stop advertising the task before it turns terminal; new submissions
        // stay blocked until the lease drops.
        lease.retire();
        let finalized = self
            .tasks
            .finalize(&task.id, exit.status, Some(exit.message.clone()));
        drop(lease);

        if finalized.is_none() {
            warn!(task_id = %task.id, "task was already finalized");
        }
        info!(
            task_id = %task.id,
            status = exit.status.label(),
            steps = steps.len(),
            message = %exit.message,
            "task finished"
        );
        Ok(TaskReport {
            task_id: task.id,
            status: exit.status,
            message: Some(exit.message),
            steps_completed: steps.len(),
            history: steps,
        })
    }

    /// Ask the running task, if any, to stop at its next step boundary.
    pub fn cancel(&self) -> bool {
        let requested = self.guard.cancel_active();
        if requested {
            info!("cancel requested for current task");
        }
        requested
    }

    pub fn status(&self) -> ControllerStatus {
        let active = self.guard.active();
        ControllerStatus {
            is_running: active.is_some(),
            current_task: active.map(|a| a.description),
        }
    }

    pub fn remaining_submissions(&self) -> usize {
        self.validator.remaining_submissions()
    }

    fn sanitize(&self, raw: &str) -> Result<String, SubmitError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubmitError::Validation("task description is empty".to_string()));
        }
        let length = trimmed.chars().count();
        if length > self.config.max_description_len {
            return Err(SubmitError::Validation(format!(
                "task description is {} characters, limit is {}",
                length, self.config.max_description_len
            )));
        }
        if let Some(pattern) = self.validator.matching_pattern(trimmed) {
            warn!(pattern, "task description matches a blocked command pattern");
            return Err(SubmitError::Validation(
                "task contains a potentially dangerous command pattern".to_string(),
            ));
        }

        if let Some(kind) = self.sensitive.detect(trimmed) {
            warn!(kind, "task description mentions sensitive data");
        }

        let stripped = self.control_chars.replace_all(trimmed, "");
        Ok(self.whitespace.replace_all(&stripped, " ").into_owned())
    }

    fn run_loop(&self, task: &Task, token: &CancellationToken) -> (LoopExit, HistoryStore) {
        let mut history = HistoryStore::new();
        let max_steps = self.config.max_steps;

        while history.len() < max_steps {
            if token.is_cancelled() {
                info!(task_id = %task.id, after = history.len(), "task cancelled");
                return (LoopExit::new(TaskStatus::Cancelled, "Task was cancelled"), history);
            }
            let index = history.len() + 1;
            debug!(task_id = %task.id, step = index, max_steps, "step started");

            let decision = match self.oracle.decide(&task.description, history.steps()) {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(task_id = %task.id, step = index, error = %err, "oracle failed");
                    let reason = err.to_string();
                    history.record(String::new(), None, StepOutcome::Errored(reason.clone()));
                    return (LoopExit::new(TaskStatus::Failed, reason), history);
                }
            };

            let action = match parse_action(
                &decision.action,
                &decision.parameters,
                decision.done,
                self.config.max_wait_secs,
            ) {
                Ok(action) => action,
                Err(err) => {
                    warn!(task_id = %task.id, step = index, error = %err, "unusable oracle reply");
                    let reason = format!("unparseable oracle reply: {}", err);
                    history.record(decision.thinking, None, StepOutcome::Errored(reason.clone()));
                    return (LoopExit::new(TaskStatus::Failed, reason), history);
                }
            };
            info!(task_id = %task.id, step = index, action = action.name(), "oracle proposed action");

            if let Verdict::Rejected(reason) = self.validator.validate(&action) {
                warn!(task_id = %task.id, step = index, %reason, "action rejected by safety policy");
                let message = format!("Safety violation: {}", reason);
                history.record(decision.thinking, Some(action), StepOutcome::Rejected(reason));
                return (LoopExit::new(TaskStatus::Failed, message), history);
            }

            if let ActionSpec::Done { reason } = &action {
                let message = reason.clone();
                let step = history.record(decision.thinking, Some(action), StepOutcome::Executed);
                if let Err(err) = self.audit_step(&task.id, step) {
                    return (audit_failure(err), history);
                }
                return (LoopExit::new(TaskStatus::Completed, message), history);
            }

            if let Err(err) = self.executor.perform(&action) {
                warn!(task_id = %task.id, step = index, error = %err, "action execution failed");
                let reason = err.to_string();
                let step = history.record(decision.thinking, Some(action), StepOutcome::Errored(reason.clone()));
                if let Err(audit_err) = self.audit_step(&task.id, step) {
                    return (audit_failure(audit_err), history);
                }
                return (LoopExit::new(TaskStatus::Failed, reason), history);
            }
            thread::sleep(self.config.settle_delay);

            let step = history.record(decision.thinking, Some(action), StepOutcome::Executed);
            if let Err(err) = self.audit_step(&task.id, step) {
                return (audit_failure(err), history);
            }
        }

        warn!(task_id = %task.id, max_steps, "step budget exhausted");
        (
            LoopExit::new(
                TaskStatus::TimedOut,
                format!("Task did not complete within {} steps", max_steps),
            ),
            history,
        )
    }

    fn audit_step(&self, task_id: &str, step: &Step) -> Result<(), AuditError> {
        let Some(action) = step.action.as_ref() else {
            return Ok(());
        };
        let outcome = match step.outcome {
            StepOutcome::Executed => AuditOutcome::Executed,
            StepOutcome::Errored(_) => AuditOutcome::Errored,
            StepOutcome::Rejected(_) => return Ok(()),
        };
        let record = self.audit.append(RecordDraft {
            task_id: task_id.to_string(),
            step_index: step.index,
            action: action.name().to_string(),
            parameters: self.sensitive.sanitize_parameters(&action.parameters()),
            outcome,
            timestamp: step.timestamp,
        })?;
        debug!(task_id, step = step.index, hash = %record.content_hash, "audit record appended");
        Ok(())
    }
}

fn audit_failure(err: AuditError) -> LoopExit {
    warn!(error = %err, "audit log append failed");
    LoopExit::new(TaskStatus::Failed, format!("audit log unavailable: {}", err))
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
