use std::thread;
use std::time::Duration;

use tracing::info;

use crate::action::ActionSpec;

use super::types::{ActionExecutor, ExecutorError};

/// Logs actions instead of injecting input. `Wait` still sleeps so pacing
/// matches a real run.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl ActionExecutor for DryRunExecutor {
    fn perform(&self, action: &ActionSpec) -> Result<(), ExecutorError> {
        match action {
            ActionSpec::Wait { seconds } => {
                info!(seconds, "dry run: waiting");
                thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
            }
            ActionSpec::TypeText { text, .. } => {
                info!(chars = text.chars().count(), point = ?action.point(), "dry run: type");
            }
            other => {
                info!(action = other.name(), parameters = %other.parameters(), "dry run");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_executable_action() {
        let executor = DryRunExecutor;
        for action in [
            ActionSpec::Click { x: 1, y: 1 },
            ActionSpec::PressKey {
                key: "enter".to_string(),
            },
            ActionSpec::Hotkey {
                keys: vec!["ctrl".to_string(), "s".to_string()],
            },
            ActionSpec::Wait { seconds: 0.0 },
            ActionSpec::TypeText {
                text: "hello".to_string(),
                x: None,
                y: None,
            },
        ] {
            assert!(executor.perform(&action).is_ok());
        }
    }
}
