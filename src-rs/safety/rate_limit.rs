use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window log of accepted submissions.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    accepted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            accepted: Mutex::new(VecDeque::new()),
        }
    }

    /// Records a submission if the window has room. On refusal returns the
    /// whole seconds until the oldest entry expires (at least 1).
    pub fn admit(&self) -> Result<(), u64> {
        self.admit_at(Instant::now())
    }

    pub fn admit_at(&self, now: Instant) -> Result<(), u64> {
        let mut accepted = self.accepted.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        evict(&mut accepted, now, self.window);
        if accepted.len() >= self.max_requests {
            let retry_after = accepted
                .front()
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                .unwrap_or(self.window);
            return Err(retry_after.as_secs().max(1));
        }
        accepted.push_back(now);
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        let mut accepted = self.accepted.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        evict(&mut accepted, Instant::now(), self.window);
        self.max_requests.saturating_sub(accepted.len())
    }
}

fn evict(accepted: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = accepted.front() {
        if now.saturating_duration_since(*oldest) >= window {
            accepted.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_beyond_limit_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.admit_at(start).is_ok());
        assert!(limiter.admit_at(start + Duration::from_secs(1)).is_ok());
        let retry = limiter.admit_at(start + Duration::from_secs(10)).unwrap_err();
        assert_eq!(retry, 50);
    }

    #[test]
    fn window_slides_forward() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.admit_at(start).is_ok());
        assert!(limiter.admit_at(start + Duration::from_secs(59)).is_err());
        assert!(limiter.admit_at(start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn retry_hint_is_at_least_one_second() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.admit_at(start).unwrap();
        let retry = limiter
            .admit_at(start + Duration::from_millis(59_900))
            .unwrap_err();
        assert_eq!(retry, 1);
    }
}
