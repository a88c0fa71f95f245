//! The tick service: a monotonic logical clock driving periodic work
//! across the Intelligence Plane (spec §4.1).
//!
//! Two modes: wall-clock (advances by one every configured interval on a
//! background task) and manual (advances only via an explicit
//! [`TickService::advance`] call, typically from a test). Subscribers fire
//! synchronously, in registration order, once per integer advance.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    #[error("advance() is only valid in manual mode")]
    ManualOnly,
    #[error("advance(n) requires n >= 1")]
    InvalidAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    WallClock,
    Manual,
}

#[derive(Debug, Clone)]
pub struct TickConfig {
    pub mode: TickMode,
    pub interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            mode: TickMode::WallClock,
            interval: Duration::from_secs(1),
        }
    }
}

type Subscriber = Box<dyn Fn(u64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner {
    mode: TickMode,
    interval: Duration,
    tick: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription_id: AtomicU64,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// A monotonic logical clock. Cheap to clone; clones share the same
/// counter and subscriber table.
#[derive(Clone)]
pub struct TickService(Arc<Inner>);

impl TickService {
    pub fn new(config: TickConfig) -> Self {
        let svc = Self(Arc::new(Inner {
            mode: config.mode,
            interval: config.interval,
            tick: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
            next_subscription_id: AtomicU64::new(1),
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }));
        if config.mode == TickMode::WallClock {
            svc.start();
        }
        svc
    }

    pub fn mode(&self) -> TickMode {
        self.0.mode
    }

    pub fn current_tick(&self) -> u64 {
        self.0.tick.load(Ordering::SeqCst)
    }

    /// Register a callback invoked once per integer advance, in
    /// registration order.
    pub fn subscribe(&self, callback: impl Fn(u64) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.0.next_subscription_id.fetch_add(1, Ordering::SeqCst));
        self.0.subscribers.lock().push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.0.subscribers.lock().retain(|(sid, _)| *sid != id);
    }

    /// Advance the clock by `n` whole ticks. Manual mode only. Fires
    /// subscribers once per unit advance, so `advance(3)` fires each
    /// subscriber three times.
    pub fn advance(&self, n: u64) -> Result<(), TickError> {
        if self.0.mode != TickMode::Manual {
            return Err(TickError::ManualOnly);
        }
        if n == 0 {
            return Err(TickError::InvalidAdvance);
        }
        for _ in 0..n {
            self.advance_one();
        }
        Ok(())
    }

    fn advance_one(&self) {
        let new_tick = self.0.tick.fetch_add(1, Ordering::SeqCst) + 1;
        let subscribers = self.0.subscribers.lock();
        for (_, callback) in subscribers.iter() {
            callback(new_tick);
        }
        tracing::debug!(tick = new_tick, "tick advanced");
    }

    /// Start (or resume) the wall-clock background task. No-op in manual
    /// mode and idempotent if already running.
    pub fn start(&self) {
        if self.0.mode != TickMode::WallClock {
            return;
        }
        if self.0.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let svc = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(svc.0.interval);
            loop {
                interval.tick().await;
                if !svc.0.running.load(Ordering::SeqCst) {
                    break;
                }
                svc.advance_one();
            }
        });
        *self.0.task.lock() = Some(handle);
    }

    /// Halt the wall-clock task. Preserves the counter; [`start`] resumes.
    pub fn stop(&self) {
        self.0.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.0.task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn manual_advance_fires_subscribers_in_order() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::Manual,
            interval: Duration::from_secs(1),
        });

        let order = Arc::new(Mutex::new(Vec::new()));
        let order_a = order.clone();
        let order_b = order.clone();
        svc.subscribe(move |t| order_a.lock().push(("a", t)));
        svc.subscribe(move |t| order_b.lock().push(("b", t)));

        svc.advance(1).unwrap();
        assert_eq!(*order.lock(), vec![("a", 1), ("b", 1)]);
    }

    #[test]
    fn advance_n_fires_each_subscriber_n_times() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::Manual,
            interval: Duration::from_secs(1),
        });
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        svc.subscribe(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        svc.advance(3).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(svc.current_tick(), 3);
    }

    #[test]
    fn advance_fails_in_wall_clock_mode() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::WallClock,
            interval: Duration::from_millis(10),
        });
        assert_eq!(svc.advance(1), Err(TickError::ManualOnly));
        svc.stop();
    }

    #[test]
    fn advance_zero_is_rejected() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::Manual,
            interval: Duration::from_secs(1),
        });
        assert_eq!(svc.advance(0), Err(TickError::InvalidAdvance));
    }

    #[test]
    fn unsubscribe_stops_future_callbacks() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::Manual,
            interval: Duration::from_secs(1),
        });
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let id = svc.subscribe(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        svc.advance(1).unwrap();
        svc.unsubscribe(id);
        svc.advance(1).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wall_clock_advances_and_stop_preserves_counter() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::WallClock,
            interval: Duration::from_millis(5),
        });
        tokio::time::sleep(Duration::from_millis(40)).await;
        svc.stop();
        let stopped_at = svc.current_tick();
        assert!(stopped_at > 0);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(svc.current_tick(), stopped_at);
    }

    #[test]
    fn start_is_idempotent() {
        let svc = TickService::new(TickConfig {
            mode: TickMode::WallClock,
            interval: Duration::from_millis(10),
        });
        svc.start();
        svc.start();
        svc.stop();
    }
}
