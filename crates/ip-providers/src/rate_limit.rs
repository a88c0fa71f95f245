//! Sliding-hour token bucket, shared by any rate-limited provider call
//! (spec §4.5 Layer 2: `layer2MaxReviewsPerHour`).

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(3600);

pub struct RateLimiter {
    max_per_hour: usize,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_hour: usize) -> Self {
        Self {
            max_per_hour,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    fn prune(&self, now: Instant) {
        let mut calls = self.calls.lock();
        while let Some(front) = calls.front() {
            if now.duration_since(*front) >= WINDOW {
                calls.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn can_review(&self, now: Instant) -> bool {
        self.prune(now);
        self.calls.lock().len() < self.max_per_hour
    }

    pub fn record(&self, now: Instant) {
        self.calls.lock().push_back(now);
    }

    pub fn remaining(&self, now: Instant) -> usize {
        self.prune(now);
        self.max_per_hour.saturating_sub(self.calls.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_then_blocks() {
        let limiter = RateLimiter::new(2);
        let now = Instant::now();
        assert!(limiter.can_review(now));
        limiter.record(now);
        assert!(limiter.can_review(now));
        limiter.record(now);
        assert!(!limiter.can_review(now));
        assert_eq!(limiter.remaining(now), 0);
    }

    #[test]
    fn window_expiry_frees_capacity() {
        let limiter = RateLimiter::new(1);
        let t0 = Instant::now();
        limiter.record(t0);
        assert!(!limiter.can_review(t0));

        let later = t0 + Duration::from_secs(3601);
        assert!(limiter.can_review(later));
        assert_eq!(limiter.remaining(later), 1);
    }
}
