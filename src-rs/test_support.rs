//! Deterministic collaborators for exercising the controller in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use crate::action::ActionSpec;
use crate::audit::AuditLog;
use crate::config::AgentConfig;
use crate::controller::TaskController;
use crate::executor::{ActionExecutor, ExecutorError};
use crate::oracle::{Decision, DecisionOracle, OracleError};
use crate::safety::SafetyZone;
use crate::task::Step;

/// Config with no settle delay and a single top-left safety zone.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        settle_delay: Duration::ZERO,
        safety_zones: vec![SafetyZone::new("top-left corner", 0, 0, 40, 40)],
        ..AgentConfig::default()
    }
}

pub fn decision(action: &str, parameters: Value) -> Decision {
    Decision {
        thinking: format!("next: {}", action),
        action: action.to_string(),
        parameters,
        done: false,
    }
}

pub fn click(x: i32, y: i32) -> Decision {
    decision("click", json!({"x": x, "y": y}))
}

pub fn type_text(text: &str) -> Decision {
    decision("type", json!({"text": text}))
}

pub fn wait(seconds: f64) -> Decision {
    decision("wait", json!({"seconds": seconds}))
}

pub fn done(reason: &str) -> Decision {
    decision("done", json!({"reason": reason}))
}

/// Replays a fixed script; once exhausted it keeps returning the last entry.
pub struct ScriptedOracle {
    script: Vec<Result<Decision, OracleError>>,
    calls: AtomicUsize,
    seen_history: Mutex<Vec<usize>>,
}

impl ScriptedOracle {
    pub fn new(script: Vec<Decision>) -> Self {
        Self::with_results(script.into_iter().map(Ok).collect())
    }

    pub fn with_results(script: Vec<Result<Decision, OracleError>>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        Self {
            script,
            calls: AtomicUsize::new(0),
            seen_history: Mutex::new(Vec::new()),
        }
    }

    pub fn always(decision: Decision) -> Self {
        Self::new(vec![decision])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// History length passed on each call.
    pub fn seen_history(&self) -> Vec<usize> {
        self.seen_history.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl DecisionOracle for ScriptedOracle {
    fn decide(&self, _task: &str, history: &[Step]) -> Result<Decision, OracleError> {
        if let Ok(mut seen) = self.seen_history.lock() {
            seen.push(history.len());
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let idx = call.min(self.script.len() - 1);
        self.script[idx].clone()
    }
}

/// Records every action it is handed; optionally fails on the n-th call.
#[derive(Default)]
pub struct RecordingExecutor {
    performed: Mutex<Vec<ActionSpec>>,
    fail_on: Option<usize>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the `call`-th perform (1-based).
    pub fn failing_on(call: usize) -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
            fail_on: Some(call),
        }
    }

    pub fn performed(&self) -> Vec<ActionSpec> {
        self.performed.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn perform(&self, action: &ActionSpec) -> Result<(), ExecutorError> {
        let mut performed = self.performed.lock().map_err(|_| ExecutorError::Failed {
            action: action.name().to_string(),
            reason: "lock error".to_string(),
        })?;
        performed.push(action.clone());
        if Some(performed.len()) == self.fail_on {
            return Err(ExecutorError::Failed {
                action: action.name().to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Executor that parks inside its `gate_at`-th call until released, so a
/// test can act while the loop is mid-step.
pub struct GatedExecutor {
    gate_at: usize,
    calls: AtomicUsize,
    reached: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

pub struct Gate {
    reached: Receiver<()>,
    release: Sender<()>,
}

impl GatedExecutor {
    pub fn new(gate_at: usize) -> (Self, Gate) {
        let (reached_tx, reached_rx) = channel();
        let (release_tx, release_rx) = channel();
        (
            Self {
                gate_at,
                calls: AtomicUsize::new(0),
                reached: Mutex::new(reached_tx),
                release: Mutex::new(release_rx),
            },
            Gate {
                reached: reached_rx,
                release: release_tx,
            },
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ActionExecutor for GatedExecutor {
    fn perform(&self, _action: &ActionSpec) -> Result<(), ExecutorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.gate_at {
            if let Ok(reached) = self.reached.lock() {
                let _ = reached.send(());
            }
            if let Ok(release) = self.release.lock() {
                let _ = release.recv_timeout(Duration::from_secs(10));
            }
        }
        Ok(())
    }
}

impl Gate {
    /// Blocks until the executor is parked at the gate.
    pub fn wait_reached(&self) {
        self.reached
            .recv_timeout(Duration::from_secs(10))
            .expect("executor never reached the gate");
    }

    pub fn open(&self) {
        let _ = self.release.send(());
    }
}

pub fn controller(
    config: AgentConfig,
    oracle: Arc<dyn DecisionOracle>,
    executor: Arc<dyn ActionExecutor>,
) -> TaskController {
    TaskController::new(config, oracle, executor, Arc::new(AuditLog::in_memory()))
        .expect("valid test controller")
}
