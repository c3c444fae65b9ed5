use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::cancel::CancellationToken;

#[derive(Clone, Debug)]
pub struct ActiveTask {
    pub task_id: String,
    pub description: String,
    pub token: CancellationToken,
}

enum Slot {
    Free,
    Running(ActiveTask),
    /// The loop has exited and the task is being finalized. Not cancellable,
    /// not reported as running, but still blocks new acquires.
    Finishing(ActiveTask),
}

/// Admits at most one running task. The slot is only ever locked for a
/// few field reads or writes, so `cancel`/`status` callers never wait on
/// the loop itself.
pub struct ConcurrencyGuard {
    slot: Mutex<Slot>,
}

impl Default for ConcurrencyGuard {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot::Free),
        }
    }
}

impl ConcurrencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot, or returns the description of the task holding it.
    pub fn try_acquire(&self, task_id: &str, description: &str) -> Result<GuardLease<'_>, String> {
        let mut slot = self.lock();
        if let Slot::Running(active) | Slot::Finishing(active) = &*slot {
            return Err(active.description.clone());
        }
        let token = CancellationToken::new();
        *slot = Slot::Running(ActiveTask {
            task_id: task_id.to_string(),
            description: description.to_string(),
            token: token.clone(),
        });
        debug!(task_id, "concurrency guard acquired");
        Ok(GuardLease { guard: self, token })
    }

    fn retire(&self) {
        let mut slot = self.lock();
        if let Slot::Running(active) = std::mem::replace(&mut *slot, Slot::Free) {
            debug!(task_id = %active.task_id, "task finishing");
            *slot = Slot::Finishing(active);
        }
    }

    fn release(&self) {
        if let Slot::Running(active) | Slot::Finishing(active) = std::mem::replace(&mut *self.lock(), Slot::Free) {
            debug!(task_id = %active.task_id, "concurrency guard released");
        }
    }

    /// The running task, if any. A finishing task is not reported.
    pub fn active(&self) -> Option<ActiveTask> {
        match &*self.lock() {
            Slot::Running(active) => Some(active.clone()),
            _ => None,
        }
    }

    pub fn is_held(&self) -> bool {
        !matches!(*self.lock(), Slot::Free)
    }

    /// Flags the running task for cancellation. Returns whether one existed.
    pub fn cancel_active(&self) -> bool {
        match &*self.lock() {
            Slot::Running(active) => {
                active.token.cancel();
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot stays consistent even if a holder panicked.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held by the loop for the lifetime of a task; dropping it frees the slot,
/// including on unwind.
pub struct GuardLease<'a> {
    guard: &'a ConcurrencyGuard,
    token: CancellationToken,
}

impl GuardLease<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Marks the task as finishing: it can no longer be cancelled or seen as
    /// running, while the slot stays taken until the lease drops.
    pub fn retire(&self) {
        self.guard.retire();
    }
}

impl Drop for GuardLease<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_conflicts_until_release() {
        let guard = ConcurrencyGuard::new();
        let lease = guard.try_acquire("t1", "first").unwrap();
        assert_eq!(guard.try_acquire("t2", "second").err().as_deref(), Some("first"));
        assert!(guard.is_held());

        drop(lease);
        assert!(!guard.is_held());
        assert!(guard.try_acquire("t3", "third").is_ok());
    }

    #[test]
    fn cancel_reaches_the_lease_token() {
        let guard = ConcurrencyGuard::new();
        assert!(!guard.cancel_active());

        let lease = guard.try_acquire("t1", "first").unwrap();
        assert!(guard.cancel_active());
        assert!(lease.token().is_cancelled());
        assert_eq!(guard.active().map(|a| a.task_id), Some("t1".to_string()));
    }

    #[test]
    fn fresh_task_gets_a_fresh_token() {
        let guard = ConcurrencyGuard::new();
        {
            let _lease = guard.try_acquire("t1", "first").unwrap();
            guard.cancel_active();
        }
        let lease = guard.try_acquire("t2", "second").unwrap();
        assert!(!lease.token().is_cancelled());
    }

    #[test]
    fn retired_task_is_neither_running_nor_cancellable() {
        let guard = ConcurrencyGuard::new();
        let lease = guard.try_acquire("t1", "first").unwrap();
        lease.retire();

        assert!(!guard.cancel_active());
        assert!(!lease.token().is_cancelled());
        assert!(guard.active().is_none());
        assert!(guard.is_held());
        assert_eq!(guard.try_acquire("t2", "second").err().as_deref(), Some("first"));

        drop(lease);
        assert!(!guard.is_held());
        assert!(guard.try_acquire("t3", "third").is_ok());
    }
}
