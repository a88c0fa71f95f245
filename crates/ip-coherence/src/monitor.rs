//! The coherence monitor: orchestrates Layers 0 through 2 and the
//! optional feedback loop behind a single serialization point (spec §4.5,
//! §5).

use crate::config::CoherenceConfig;
use crate::feedback::{FeedbackLoop, ThresholdAdjustment};
use crate::layer0;
use crate::layer1::{self, should_run_layer1_scan};
use crate::layer1c::{self, should_run_layer1c_sweep};
use crate::layer2;
use crate::state::State;
use ip_providers::{EmbeddingService, LlmReviewService, RateLimiter};
use ip_store::KnowledgeStore;
use ip_types::{ArtifactEvent, CoherenceEvent};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;

pub struct CoherenceMonitor {
    config: CoherenceConfig,
    embedding_service: Arc<dyn EmbeddingService>,
    /// Used for both the Layer 1c sweep and the Layer 2 deep review; each
    /// is gated independently by config (spec §4.5 "when enabled and
    /// attached").
    llm_service: Option<Arc<dyn LlmReviewService>>,
    review_model: String,
    rate_limiter: RateLimiter,
    state: AsyncMutex<State>,
    feedback_loop: Option<AsyncMutex<FeedbackLoop>>,
}

impl CoherenceMonitor {
    pub fn new(
        config: CoherenceConfig,
        embedding_service: Arc<dyn EmbeddingService>,
        llm_service: Option<Arc<dyn LlmReviewService>>,
        review_model: impl Into<String>,
    ) -> Self {
        let promotion_threshold = config.layer1_promotion_threshold;
        let rate_limiter = RateLimiter::new(config.layer2_max_reviews_per_hour);
        let feedback_loop = config
            .feedback_loop
            .clone()
            .map(|fc| AsyncMutex::new(FeedbackLoop::new(fc)));
        Self {
            config,
            embedding_service,
            llm_service,
            review_model: review_model.into(),
            rate_limiter,
            state: AsyncMutex::new(State::new(promotion_threshold)),
            feedback_loop,
        }
    }

    /// The single serialization point: a scan is never interleaved with
    /// an artifact-processing mutation (spec §5).
    pub async fn process_artifact(
        &self,
        artifact: &ArtifactEvent,
        source_path: Option<&str>,
    ) -> Option<CoherenceEvent> {
        let mut state = self.state.lock().await;
        layer0::process_artifact(&mut state, artifact, source_path)
    }

    pub async fn should_run_layer1_scan(&self, current_tick: u64) -> bool {
        let state = self.state.lock().await;
        should_run_layer1_scan(&state, &self.config, current_tick)
    }

    pub async fn run_layer1_scan(&self, store: &dyn KnowledgeStore, current_tick: u64) -> Vec<CoherenceEvent> {
        let mut state = self.state.lock().await;
        layer1::run_layer1_scan(&mut state, &self.config, self.embedding_service.as_ref(), store, current_tick).await
    }

    pub async fn should_run_layer1c_sweep(&self, current_tick: u64) -> bool {
        let state = self.state.lock().await;
        should_run_layer1c_sweep(&state, &self.config, current_tick)
    }

    pub async fn run_layer1c_sweep(
        &self,
        store: &dyn KnowledgeStore,
        current_tick: u64,
    ) -> Vec<CoherenceEvent> {
        let Some(llm) = &self.llm_service else { return Vec::new() };
        let mut state = self.state.lock().await;
        layer1c::run_layer1c_sweep(&mut state, &self.config, llm.as_ref(), store, &self.review_model, current_tick)
            .await
    }

    /// Runs one Layer 2 pass and, when a feedback loop is configured,
    /// feeds it this batch's confirmed/dismissed tally.
    pub async fn run_layer2_review(&self, store: &dyn KnowledgeStore, now: Instant) -> Vec<CoherenceEvent> {
        let Some(llm) = &self.llm_service else { return Vec::new() };
        if !self.config.enable_layer2 {
            return Vec::new();
        }
        let mut state = self.state.lock().await;
        let before_dismissed = state.dismissed.len();
        let events =
            layer2::run_layer2_review(&mut state, &self.config, llm.as_ref(), store, &self.rate_limiter, now).await;
        let reviewed = state.dismissed.len().saturating_sub(before_dismissed) as u64;
        let confirmed = events.len() as u64;
        let dismissed_without_event = reviewed.saturating_sub(confirmed);

        if let Some(feedback_loop) = &self.feedback_loop {
            if reviewed > 0 {
                let mut loop_guard = feedback_loop.lock().await;
                loop_guard.record_batch(confirmed, dismissed_without_event, &mut state.promotion_threshold);
            }
        }

        events
    }

    pub async fn threshold_history(&self) -> Vec<ThresholdAdjustment> {
        match &self.feedback_loop {
            Some(feedback_loop) => feedback_loop.lock().await.threshold_history().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn current_promotion_threshold(&self) -> f64 {
        self.state.lock().await.promotion_threshold
    }

    pub async fn pending_candidate_count(&self) -> usize {
        let state = self.state.lock().await;
        state.candidates.values().filter(|c| c.promoted_to_layer2 && !state.dismissed.contains(&c.pair)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ip_providers::MockEmbeddingService;
    use ip_store::InMemoryKnowledgeStore;
    use ip_types::{ArtifactKind, ArtifactStatus, Provenance};

    fn artifact(id: &str, agent: &str, workstream: &str) -> ArtifactEvent {
        ArtifactEvent {
            artifact_id: id.to_string(),
            agent_id: agent.to_string(),
            workstream: workstream.to_string(),
            kind: ArtifactKind::Code,
            status: ArtifactStatus::Draft,
            mime_type: None,
            content_hash: None,
            quality_score: None,
            provenance: Provenance {
                creator: agent.to_string(),
                created_at: Utc::now(),
                source_path: None,
                source_artifact_ids: vec![],
            },
        }
    }

    #[tokio::test]
    async fn process_artifact_detects_layer0_conflict() {
        let monitor = CoherenceMonitor::new(
            CoherenceConfig::default(),
            Arc::new(MockEmbeddingService::new(8)),
            None,
            "mock-model",
        );
        let a1 = artifact("art-1", "a-1", "ws-backend");
        let a2 = artifact("art-2", "a-2", "ws-frontend");
        assert!(monitor.process_artifact(&a1, Some("/src/app.ts")).await.is_none());
        let issue = monitor.process_artifact(&a2, Some("/src/app.ts")).await.unwrap();
        assert_eq!(issue.affected_artifact_ids.len(), 2);
    }

    #[tokio::test]
    async fn layer2_disabled_when_no_llm_service_attached() {
        let monitor = CoherenceMonitor::new(
            CoherenceConfig::default(),
            Arc::new(MockEmbeddingService::new(8)),
            None,
            "mock-model",
        );
        let store = InMemoryKnowledgeStore::new();
        let events = monitor.run_layer2_review(&store, Instant::now()).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn should_run_layer1_scan_requires_changed_artifacts_and_elapsed_interval() {
        let monitor = CoherenceMonitor::new(
            CoherenceConfig::default(),
            Arc::new(MockEmbeddingService::new(8)),
            None,
            "mock-model",
        );
        assert!(!monitor.should_run_layer1_scan(20).await);
        monitor.process_artifact(&artifact("art-1", "a-1", "ws-backend"), None).await;
        assert!(monitor.should_run_layer1_scan(20).await);
        assert!(!monitor.should_run_layer1_scan(5).await);
    }
}
