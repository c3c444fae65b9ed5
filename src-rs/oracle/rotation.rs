use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin over API keys, shared across threads.
pub struct Rotator {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl Rotator {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn next(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Some(&self.keys[idx])
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_keys() {
        let rotator = Rotator::new(vec!["a".to_string(), "b".to_string()]);
        let seen: Vec<&str> = (0..3).filter_map(|_| rotator.next()).collect();
        assert_eq!(seen, vec!["a", "b", "a"]);
        assert!(Rotator::new(Vec::new()).next().is_none());
    }
}
