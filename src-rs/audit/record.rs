use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::hasher;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Executed,
    Errored,
}

/// The caller-supplied part of a record, before the log seals it.
/// `parameters` must already be in the form that may be persisted.
#[derive(Clone, Debug)]
pub struct RecordDraft {
    pub task_id: String,
    pub step_index: u32,
    pub action: String,
    pub parameters: Value,
    pub outcome: AuditOutcome,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub task_id: String,
    pub step_index: u32,
    pub action: String,
    pub parameters: Value,
    pub outcome: AuditOutcome,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: Option<String>,
    pub content_hash: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashedFields<'a> {
    task_id: &'a str,
    step_index: u32,
    action: &'a str,
    parameters: &'a Value,
    outcome: AuditOutcome,
    timestamp: &'a DateTime<Utc>,
    previous_hash: Option<&'a str>,
}

impl AuditRecord {
    pub fn seal(draft: RecordDraft, previous_hash: Option<String>) -> Result<Self, serde_json::Error> {
        let mut record = Self {
            task_id: draft.task_id,
            step_index: draft.step_index,
            action: draft.action,
            parameters: draft.parameters,
            outcome: draft.outcome,
            timestamp: draft.timestamp,
            previous_hash,
            content_hash: String::new(),
        };
        record.content_hash = record.compute_hash()?;
        Ok(record)
    }

    /// Recomputes the digest from the current field values.
    pub fn compute_hash(&self) -> Result<String, serde_json::Error> {
        hasher::digest_json(&HashedFields {
            task_id: &self.task_id,
            step_index: self.step_index,
            action: &self.action,
            parameters: &self.parameters,
            outcome: self.outcome,
            timestamp: &self.timestamp,
            previous_hash: self.previous_hash.as_deref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> RecordDraft {
        RecordDraft {
            task_id: "task_1".to_string(),
            step_index: 1,
            action: "click".to_string(),
            parameters: json!({"x": 5, "y": 6}),
            outcome: AuditOutcome::Executed,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn sealed_hash_matches_recomputation() {
        let record = AuditRecord::seal(draft(), None).unwrap();
        assert_eq!(record.compute_hash().unwrap(), record.content_hash);
    }

    #[test]
    fn edited_field_changes_hash() {
        let mut record = AuditRecord::seal(draft(), None).unwrap();
        record.parameters = json!({"x": 500, "y": 6});
        assert_ne!(record.compute_hash().unwrap(), record.content_hash);
    }

    #[test]
    fn previous_hash_is_covered() {
        let a = AuditRecord::seal(draft(), None).unwrap();
        let mut b = a.clone();
        b.previous_hash = Some("ff".repeat(32));
        assert_ne!(b.compute_hash().unwrap(), a.content_hash);
    }
}
