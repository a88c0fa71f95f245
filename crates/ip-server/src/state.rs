//! Shared application state: one instance of every engine, wired
//! together the way the teacher's pillar binaries wire a single
//! `Coordinator`/`AppState` (`agentkern-arbiter/src/bin/server.rs`).

use ip_bus::EventBus;
use ip_coherence::CoherenceMonitor;
use ip_context::ContextInjectionTracker;
use ip_decisions::DecisionQueue;
use ip_providers::{EmbeddingService, LlmReviewService, MockEmbeddingService, MockLlmReviewService};
use ip_store::{InMemoryKnowledgeStore, KnowledgeStore};
use ip_tick::TickService;
use ip_trust::TrustEngine;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ServerConfig;

pub const SNAPSHOT_DIMENSION: usize = 8;

pub struct AppState {
    pub tick: TickService,
    pub bus: EventBus,
    pub trust: TrustEngine,
    pub decisions: DecisionQueue,
    pub coherence: CoherenceMonitor,
    pub context: ContextInjectionTracker,
    pub store: Arc<dyn KnowledgeStore>,
    pub snapshot_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Arc<Self> {
        let embedding_service: Arc<dyn EmbeddingService> = Arc::new(MockEmbeddingService::new(SNAPSHOT_DIMENSION));
        let llm_service: Arc<dyn LlmReviewService> = Arc::new(MockLlmReviewService::new());

        let coherence = CoherenceMonitor::new(
            config.coherence.clone(),
            embedding_service,
            Some(llm_service),
            config.review_model.clone(),
        );

        let (snapshot_tx, _rx) = broadcast::channel(256);

        Arc::new(Self {
            tick: TickService::new(config.tick.clone()),
            bus: EventBus::new(Default::default()),
            trust: TrustEngine::new(Default::default()),
            decisions: DecisionQueue::new(),
            coherence,
            context: ContextInjectionTracker::new(Default::default()),
            store: Arc::new(InMemoryKnowledgeStore::new()),
            snapshot_tx,
        })
    }

    /// Builds and broadcasts the state-sync snapshot (spec §6.4): project
    /// snapshot, active agents, trust scores, current control mode.
    /// Called on a schedule and whenever a change makes the snapshot
    /// stale enough to be worth pushing.
    pub fn publish_snapshot(&self, control_mode: ip_types::ControlMode) {
        let trust_scores: Vec<serde_json::Value> = self
            .trust
            .snapshot()
            .into_iter()
            .map(|s| serde_json::json!({ "agentId": s.agent_id, "score": s.score }))
            .collect();
        let active_agents: Vec<&str> =
            trust_scores.iter().filter_map(|v| v.get("agentId").and_then(|a| a.as_str())).collect();

        let snapshot = serde_json::json!({
            "tick": self.tick.current_tick(),
            "project": serde_json::Value::Null,
            "activeAgents": active_agents,
            "trustScores": trust_scores,
            "controlMode": control_mode,
        });

        // No subscribers yet is the common case before the first
        // WebSocket client connects; that's not an error.
        let _ = self.snapshot_tx.send(snapshot.to_string());
    }
}
