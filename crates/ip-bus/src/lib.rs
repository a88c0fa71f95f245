//! The in-memory event bus: typed publish/subscribe with at-least-once
//! in-process delivery, per-subscriber queue caps, and backpressure
//! (spec §4.2).
//!
//! The publisher never blocks: a subscriber whose queue is full is
//! skipped for that event and its overflow counter is incremented. A
//! bus-wide cap on buffered events protects against unbounded fan-out;
//! once reached, new publications fail fast with [`BusError::Overloaded`].

use ip_types::{ArtifactEvent, DecisionEvent, HumanResolution};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct ResolutionEvent {
    pub decision_id: String,
    pub agent_id: String,
    pub workstream: String,
    pub resolution: Option<HumanResolution>,
    pub timed_out: bool,
    pub tick: u64,
}

#[derive(Debug, Clone)]
pub struct TrustOutcomeEvent {
    pub agent_id: String,
    pub outcome: String,
    pub effective_delta: i32,
    pub new_global_score: i32,
    pub tick: u64,
}

#[derive(Debug, Clone)]
pub enum BusEvent {
    Artifact(ArtifactEvent),
    Decision(DecisionEvent),
    Resolution(ResolutionEvent),
    TrustOutcome(TrustOutcomeEvent),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("event bus is overloaded: buffered event cap reached")]
    Overloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone)]
pub struct BusConfig {
    pub per_subscriber_capacity: usize,
    pub total_buffered_cap: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            per_subscriber_capacity: 500,
            total_buffered_cap: 10_000,
        }
    }
}

struct Subscriber {
    sender: mpsc::Sender<BusEvent>,
    overflow_count: AtomicU64,
}

struct Inner {
    config: BusConfig,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_subscription_id: AtomicU64,
    total_buffered: Arc<AtomicUsize>,
}

/// A handle to the bus's receiving side for one subscriber. Decrements
/// the bus's buffered-event counter as messages are drained, so the
/// bus-wide cap reflects events actually waiting in a queue.
pub struct BusReceiver {
    receiver: mpsc::Receiver<BusEvent>,
    total_buffered: Arc<AtomicUsize>,
}

impl BusReceiver {
    pub async fn recv(&mut self) -> Option<BusEvent> {
        let event = self.receiver.recv().await?;
        self.total_buffered.fetch_sub(1, Ordering::SeqCst);
        Some(event)
    }
}

#[derive(Clone)]
pub struct EventBus(Arc<Inner>);

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self(Arc::new(Inner {
            config,
            subscribers: RwLock::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
            total_buffered: Arc::new(AtomicUsize::new(0)),
        }))
    }

    pub fn subscribe(&self) -> (SubscriptionId, BusReceiver) {
        let id = self.0.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(self.0.config.per_subscriber_capacity);
        self.0.subscribers.write().insert(
            id,
            Subscriber {
                sender: tx,
                overflow_count: AtomicU64::new(0),
            },
        );
        (
            SubscriptionId(id),
            BusReceiver {
                receiver: rx,
                total_buffered: self.0.total_buffered.clone(),
            },
        )
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.0.subscribers.write().remove(&id.0);
    }

    pub fn overflow_count(&self, id: SubscriptionId) -> u64 {
        self.0
            .subscribers
            .read()
            .get(&id.0)
            .map(|s| s.overflow_count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Publish to every current subscriber. Never blocks: a full
    /// subscriber queue is skipped (overflow counted) rather than
    /// stalling the publisher.
    pub fn publish(&self, event: BusEvent) -> Result<(), BusError> {
        if self.0.total_buffered.load(Ordering::SeqCst) >= self.0.config.total_buffered_cap {
            return Err(BusError::Overloaded);
        }

        let subscribers = self.0.subscribers.read();
        for subscriber in subscribers.values() {
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => {
                    self.0.total_buffered.fetch_add(1, Ordering::SeqCst);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    subscriber.overflow_count.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!("subscriber queue full, event skipped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!("subscriber channel closed, event dropped");
                }
            }
        }
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ip_types::{ArtifactKind, ArtifactStatus, Provenance};

    fn sample_artifact(id: &str) -> ArtifactEvent {
        ArtifactEvent {
            artifact_id: id.to_string(),
            agent_id: "a-1".to_string(),
            workstream: "ws-backend".to_string(),
            kind: ArtifactKind::Code,
            status: ArtifactStatus::Draft,
            mime_type: None,
            content_hash: None,
            quality_score: None,
            provenance: Provenance {
                creator: "a-1".to_string(),
                created_at: Utc::now(),
                source_path: None,
                source_artifact_ids: vec![],
            },
        }
    }

    #[tokio::test]
    async fn delivers_to_subscriber_in_publish_order() {
        let bus = EventBus::new(BusConfig::default());
        let (_id, mut rx) = bus.subscribe();

        bus.publish(BusEvent::Artifact(sample_artifact("art-1")))
            .unwrap();
        bus.publish(BusEvent::Artifact(sample_artifact("art-2")))
            .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        match (first, second) {
            (BusEvent::Artifact(a), BusEvent::Artifact(b)) => {
                assert_eq!(a.artifact_id, "art-1");
                assert_eq!(b.artifact_id, "art-2");
            }
            _ => panic!("expected artifact events"),
        }
    }

    #[tokio::test]
    async fn full_subscriber_queue_is_skipped_not_blocked() {
        let bus = EventBus::new(BusConfig {
            per_subscriber_capacity: 1,
            total_buffered_cap: 100,
        });
        let (id, _rx) = bus.subscribe(); // never drained

        bus.publish(BusEvent::Artifact(sample_artifact("art-1")))
            .unwrap();
        // second publish should not block even though the queue is full
        bus.publish(BusEvent::Artifact(sample_artifact("art-2")))
            .unwrap();

        assert_eq!(bus.overflow_count(id), 1);
    }

    #[tokio::test]
    async fn bus_wide_cap_rejects_overload() {
        let bus = EventBus::new(BusConfig {
            per_subscriber_capacity: 10,
            total_buffered_cap: 2,
        });
        let (_id, _rx) = bus.subscribe();

        bus.publish(BusEvent::Artifact(sample_artifact("art-1")))
            .unwrap();
        bus.publish(BusEvent::Artifact(sample_artifact("art-2")))
            .unwrap();
        let result = bus.publish(BusEvent::Artifact(sample_artifact("art-3")));
        assert_eq!(result, Err(BusError::Overloaded));
    }

    #[tokio::test]
    async fn draining_frees_bus_wide_capacity() {
        let bus = EventBus::new(BusConfig {
            per_subscriber_capacity: 10,
            total_buffered_cap: 1,
        });
        let (_id, mut rx) = bus.subscribe();

        bus.publish(BusEvent::Artifact(sample_artifact("art-1")))
            .unwrap();
        assert_eq!(
            bus.publish(BusEvent::Artifact(sample_artifact("art-2"))),
            Err(BusError::Overloaded)
        );

        rx.recv().await.unwrap();
        bus.publish(BusEvent::Artifact(sample_artifact("art-3")))
            .unwrap();
    }

    #[tokio::test]
    async fn unsubscribe_removes_subscriber() {
        let bus = EventBus::new(BusConfig::default());
        let (id, _rx) = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
