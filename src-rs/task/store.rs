use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::types::{Task, TaskStatus};

static COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Default number of tasks kept before finished ones are evicted.
pub const DEFAULT_CAPACITY: usize = 200;

/// In-memory registry of submitted tasks and their terminal outcomes.
///
/// Holds at most `capacity` tasks; beyond that the oldest finished tasks are
/// evicted. Running tasks are never evicted.
pub struct TaskStore {
    capacity: usize,
    tasks: RwLock<HashMap<String, Task>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, description: &str) -> Task {
        self.create_with_id(next_id(), description)
    }

    /// Registers a running task under an id obtained from [`next_id`].
    pub fn create_with_id(&self, id: String, description: &str) -> Task {
        let task = Task {
            id: id.clone(),
            description: description.to_string(),
            status: TaskStatus::Running,
            message: None,
            started_at: Utc::now(),
            ended_at: None,
        };
        if let Ok(mut map) = self.tasks.write() {
            map.insert(id, task.clone());
            evict_finished(&mut map, self.capacity);
        }
        task
    }

    pub fn len(&self) -> usize {
        self.tasks.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves a running task to `status`. A task that is already terminal is
    /// left untouched and `None` is returned.
    pub fn finalize(&self, id: &str, status: TaskStatus, message: Option<String>) -> Option<Task> {
        let mut map = self.tasks.write().ok()?;
        let task = map.get_mut(id)?;
        if task.status.is_terminal() {
            return None;
        }
        task.status = status;
        task.message = message;
        if status.is_terminal() {
            task.ended_at = Some(Utc::now());
        }
        Some(task.clone())
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let map = self.tasks.read().ok()?;
        map.get(id).cloned()
    }

    pub fn list(&self, limit: usize) -> Vec<Task> {
        let map = match self.tasks.read() {
            Ok(lock) => lock,
            Err(_) => return vec![],
        };
        let mut items: Vec<Task> = map.values().cloned().collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| b.id.cmp(&a.id)));
        items.truncate(limit);
        items
    }
}

fn evict_finished(map: &mut HashMap<String, Task>, capacity: usize) {
    if map.len() <= capacity {
        return;
    }
    let mut finished: Vec<(DateTime<Utc>, String)> = map
        .values()
        .filter(|task| task.status.is_terminal())
        .map(|task| (task.started_at, task.id.clone()))
        .collect();
    finished.sort();
    let excess = map.len() - capacity;
    for (_, id) in finished.into_iter().take(excess) {
        map.remove(&id);
    }
}

pub fn next_id() -> String {
    let count = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("task_{}_{}", Utc::now().timestamp_millis(), count)
}
