use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::error::AuditError;
use super::record::{AuditRecord, RecordDraft};

struct LogState {
    records: VecDeque<AuditRecord>,
    last_hash: Option<String>,
    writer: Option<BufWriter<File>>,
}

/// Append-only audit log. `append` is the only mutator.
///
/// Records appended by this process are kept in memory for `read`, up to an
/// optional limit. When opened on a path every record is also written as one
/// JSON line and flushed; reopening only recovers the chain tail, use
/// [`read_file`] for the full history.
pub struct AuditLog {
    path: Option<PathBuf>,
    memory_limit: Option<usize>,
    state: Mutex<LogState>,
}

impl AuditLog {
    pub fn in_memory() -> Self {
        Self::with_state(None, None, None)
    }

    /// Opens (or creates) a JSONL log. Only the last record's hash is kept
    /// so the chain continues across restarts.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let (existing, last_hash) = if path.exists() {
            scan_tail(&path)?
        } else {
            (0, None)
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Open {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), existing, "audit log opened");
        Ok(Self::with_state(Some(path), last_hash, Some(BufWriter::new(file))))
    }

    fn with_state(path: Option<PathBuf>, last_hash: Option<String>, writer: Option<BufWriter<File>>) -> Self {
        Self {
            path,
            memory_limit: None,
            state: Mutex::new(LogState {
                records: VecDeque::new(),
                last_hash,
                writer,
            }),
        }
    }

    /// Keep at most `limit` records in memory, dropping the oldest. The
    /// chain and the file are unaffected.
    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = Some(limit.max(1));
        self
    }

    /// Seals `draft` onto the end of the chain and stores it.
    pub fn append(&self, draft: RecordDraft) -> Result<AuditRecord, AuditError> {
        let mut state = self.state.lock().map_err(|_| AuditError::Poisoned)?;
        let record = AuditRecord::seal(draft, state.last_hash.clone())?;
        if let Some(writer) = state.writer.as_mut() {
            let line = serde_json::to_string(&record)?;
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        state.last_hash = Some(record.content_hash.clone());
        state.records.push_back(record.clone());
        if let Some(limit) = self.memory_limit {
            while state.records.len() > limit {
                state.records.pop_front();
            }
        }
        Ok(record)
    }

    /// In-memory records of one task, in append order.
    pub fn read(&self, task_id: &str) -> Vec<AuditRecord> {
        match self.state.lock() {
            Ok(state) => state
                .records
                .iter()
                .filter(|record| record.task_id == task_id)
                .cloned()
                .collect(),
            Err(_) => vec![],
        }
    }

    pub fn read_all(&self) -> Vec<AuditRecord> {
        match self.state.lock() {
            Ok(state) => state.records.iter().cloned().collect(),
            Err(_) => vec![],
        }
    }

    /// Hash the next appended record will link to.
    pub fn last_hash(&self) -> Option<String> {
        self.state.lock().ok().and_then(|state| state.last_hash.clone())
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Every record of a persisted log, for offline verification.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditError> {
    let mut records = Vec::new();
    for_each_line(path.as_ref(), |record| records.push(record))?;
    Ok(records)
}

fn scan_tail(path: &Path) -> Result<(usize, Option<String>), AuditError> {
    let mut count = 0;
    let mut last_hash = None;
    for_each_line(path, |record| {
        count += 1;
        last_hash = Some(record.content_hash);
    })?;
    Ok((count, last_hash))
}

fn for_each_line(path: &Path, mut visit: impl FnMut(AuditRecord)) -> Result<(), AuditError> {
    let file = File::open(path).map_err(|source| AuditError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        visit(serde_json::from_str(&line)?);
    }
    Ok(())
}

/// Checks every record's `contentHash` against its fields.
pub fn verify_records(records: &[AuditRecord]) -> Result<(), AuditError> {
    for (position, record) in records.iter().enumerate() {
        let expected = record.compute_hash()?;
        if expected != record.content_hash {
            return Err(violation(
                position,
                record,
                format!("content hash {} does not match {}", record.content_hash, expected),
            ));
        }
    }
    Ok(())
}

/// Checks content hashes and that each record links to its predecessor.
/// Expects the complete log, not a per-task subset.
pub fn verify_chain(records: &[AuditRecord]) -> Result<(), AuditError> {
    verify_records(records)?;
    let mut previous: Option<&str> = None;
    for (position, record) in records.iter().enumerate() {
        if record.previous_hash.as_deref() != previous {
            return Err(violation(
                position,
                record,
                format!(
                    "previous hash {} does not link to {}",
                    record.previous_hash.as_deref().unwrap_or("none"),
                    previous.unwrap_or("none")
                ),
            ));
        }
        previous = Some(record.content_hash.as_str());
    }
    Ok(())
}

fn violation(position: usize, record: &AuditRecord, detail: String) -> AuditError {
    AuditError::IntegrityViolation {
        position,
        task_id: record.task_id.clone(),
        step_index: record.step_index,
        detail,
    }
}
