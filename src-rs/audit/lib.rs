//! Append-only audit trail of approved steps.
//!
//! Every record carries a SHA-256 `contentHash` over its other fields,
//! including `previousHash`, so edits, insertions and deletions are
//! detectable after the fact. The log never rejects a record itself; callers
//! run [`verify_records`] or [`verify_chain`] when they need the check.

pub mod error;
pub mod hasher;
pub mod log;
pub mod record;

pub use error::AuditError;
pub use log::{read_file, verify_chain, verify_records, AuditLog};
pub use record::{AuditOutcome, AuditRecord, RecordDraft};
