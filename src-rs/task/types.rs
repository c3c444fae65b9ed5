use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::action::ActionSpec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    TimedOut,
    Cancelled,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Running)
    }

    /// Status string used on the `/execute` response.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Completed => "success",
            TaskStatus::TimedOut => "timeout",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Failed => "error",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Executed,
    Rejected(String),
    Errored(String),
}

/// One loop iteration. `action` is `None` only when the oracle produced
/// nothing usable.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub index: u32,
    pub rationale: String,
    pub action: Option<ActionSpec>,
    pub outcome: StepOutcome,
    pub timestamp: DateTime<Utc>,
}

impl Step {
    pub fn action_name(&self) -> &'static str {
        self.action.as_ref().map(ActionSpec::name).unwrap_or("none")
    }

    pub fn is_done(&self) -> bool {
        self.action.as_ref().is_some_and(ActionSpec::is_done)
    }
}

#[derive(Serialize)]
struct StepWire<'a> {
    step: u32,
    thinking: &'a str,
    action: &'a str,
    parameters: Value,
    done: bool,
    outcome: &'a StepOutcome,
    timestamp: &'a DateTime<Utc>,
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StepWire {
            step: self.index,
            thinking: &self.rationale,
            action: self.action_name(),
            parameters: self
                .action
                .as_ref()
                .map(ActionSpec::parameters)
                .unwrap_or_else(|| json!({})),
            done: self.is_done(),
            outcome: &self.outcome,
            timestamp: &self.timestamp,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_serializes_to_history_shape() {
        let step = Step {
            index: 3,
            rationale: "the start button is visible".to_string(),
            action: Some(ActionSpec::Click { x: 24, y: 1060 }),
            outcome: StepOutcome::Executed,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["step"], 3);
        assert_eq!(value["thinking"], "the start button is visible");
        assert_eq!(value["action"], "click");
        assert_eq!(value["parameters"], json!({"x": 24, "y": 1060}));
        assert_eq!(value["done"], false);
        assert_eq!(value["outcome"], json!({"kind": "executed"}));
    }

    #[test]
    fn errored_step_without_action() {
        let step = Step {
            index: 1,
            rationale: String::new(),
            action: None,
            outcome: StepOutcome::Errored("oracle unavailable".to_string()),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["action"], "none");
        assert_eq!(value["parameters"], json!({}));
        assert_eq!(
            value["outcome"],
            json!({"kind": "errored", "reason": "oracle unavailable"})
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Running.is_terminal());
        for status in [
            TaskStatus::Completed,
            TaskStatus::TimedOut,
            TaskStatus::Cancelled,
            TaskStatus::Failed,
        ] {
            assert!(status.is_terminal());
        }
        assert_eq!(TaskStatus::TimedOut.label(), "timeout");
    }
}
