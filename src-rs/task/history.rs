use chrono::Utc;

use crate::action::ActionSpec;

use super::types::{Step, StepOutcome};

/// Steps of the task currently owned by the loop. Indices are assigned
/// here, so they are always 1-based and contiguous.
#[derive(Debug, Default)]
pub struct HistoryStore {
    steps: Vec<Step>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn record(&mut self, rationale: String, action: Option<ActionSpec>, outcome: StepOutcome) -> &Step {
        let index = self.steps.len() as u32 + 1;
        self.steps.push(Step {
            index,
            rationale,
            action,
            outcome,
            timestamp: Utc::now(),
        });
        &self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_contiguous_from_one() {
        let mut history = HistoryStore::new();
        history.record("a".to_string(), Some(ActionSpec::Wait { seconds: 1.0 }), StepOutcome::Executed);
        history.record("b".to_string(), None, StepOutcome::Errored("boom".to_string()));
        history.record(
            "c".to_string(),
            Some(ActionSpec::Click { x: 1, y: 1 }),
            StepOutcome::Rejected("zone".to_string()),
        );

        let indices: Vec<u32> = history.steps().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(history.into_steps().len(), 3);
    }
}
