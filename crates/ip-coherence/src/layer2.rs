//! Layer 2 — rate-limited LLM deep review of promoted candidates (spec
//! §4.5).

use crate::config::CoherenceConfig;
use crate::state::State;
use ip_providers::{CandidatePairContext, Confidence, LlmReviewService, RateLimiter, ReviewRequest};
use ip_store::KnowledgeStore;
use ip_types::{CoherenceCategory, CoherenceEvent, Severity};
use std::time::Instant;

const BATCH_SIZE: usize = 5;

/// A single Layer 2 pass. Candidates `promotedToLayer2 = true` and not
/// yet dismissed are reviewed (subject to the rate limiter and batch
/// cap); each is dismissed exactly once, so calling this twice in a row
/// surfaces results only the first time for a given candidate (spec §8).
pub(crate) async fn run_layer2_review(
    state: &mut State,
    config: &CoherenceConfig,
    review_service: &dyn LlmReviewService,
    store: &dyn KnowledgeStore,
    rate_limiter: &RateLimiter,
    now: Instant,
) -> Vec<CoherenceEvent> {
    let mut events = Vec::new();

    let mut candidates: Vec<_> = state
        .candidates
        .values()
        .filter(|c| c.promoted_to_layer2 && !state.dismissed.contains(&c.pair))
        .cloned()
        .collect();
    candidates.sort_by_key(|c| c.id);

    if config.skip_layer2_for_embeddings {
        let (embedding_only, remaining): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.source == Some(ip_types::CandidateSource::Embedding));
        candidates = remaining;

        for candidate in embedding_only {
            state.dismissed.insert(candidate.pair.clone());
            if state.emitted_pairs.contains(&candidate.pair) {
                continue;
            }
            state.emitted_pairs.insert(candidate.pair.clone());
            events.push(CoherenceEvent {
                id: state.issue_ids.next(),
                title: format!(
                    "Confirmed: duplication between {} and {}",
                    candidate.pair.0, candidate.pair.1
                ),
                description: format!("similarity score {:.2}", candidate.similarity_score),
                category: CoherenceCategory::Duplication,
                severity: Severity::Medium,
                affected_workstreams: [candidate.workstream_a.clone(), candidate.workstream_b.clone()]
                    .into_iter()
                    .collect(),
                affected_artifact_ids: vec![candidate.pair.0.clone(), candidate.pair.1.clone()],
            });
        }
    }

    if !rate_limiter.can_review(now) {
        return events;
    }
    let batch: Vec<_> = candidates.into_iter().take(BATCH_SIZE).collect();
    if batch.is_empty() {
        return events;
    }

    let mut contents = std::collections::HashMap::new();
    for candidate in &batch {
        for artifact_id in [&candidate.pair.0, &candidate.pair.1] {
            if contents.contains_key(artifact_id) {
                continue;
            }
            if let Some(artifact) = store.get_artifact(artifact_id).await {
                if let Some(content) = store.get_artifact_content(&artifact.agent_id, artifact_id).await {
                    contents.insert(artifact_id.clone(), content);
                }
            }
        }
    }

    let pairs = batch
        .iter()
        .map(|c| CandidatePairContext {
            artifact_a: c.pair.0.clone(),
            artifact_b: c.pair.1.clone(),
            category: c.category,
            similarity_score: c.similarity_score,
        })
        .collect();

    rate_limiter.record(now);
    let request = ReviewRequest {
        pairs,
        contents,
        decision_context: None,
        workstream_context: None,
    };

    let results = match review_service.review(request).await {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!(error = %err, "Layer 2 review call failed");
            return events;
        }
    };

    for result in results {
        let pair = ip_types::CanonicalPairKey::new(&result.artifact_a, &result.artifact_b);
        state.dismissed.insert(pair.clone());

        if !result.confirmed || result.confidence == Confidence::Low {
            continue;
        }
        if state.emitted_pairs.contains(&pair) {
            continue;
        }
        let Some(candidate) = state.candidates.get(&pair) else { continue };
        let severity = if result.confidence == Confidence::Likely {
            Severity::Low
        } else {
            result.severity.unwrap_or(Severity::Medium)
        };
        let title_prefix = if result.confidence == Confidence::Likely { "Advisory" } else { "Confirmed" };
        state.emitted_pairs.insert(pair.clone());
        events.push(CoherenceEvent {
            id: state.issue_ids.next(),
            title: format!("{title_prefix}: {} / {}", result.artifact_a, result.artifact_b),
            description: result.explanation,
            category: candidate.category,
            severity,
            affected_workstreams: [candidate.workstream_a.clone(), candidate.workstream_b.clone()]
                .into_iter()
                .collect(),
            affected_artifact_ids: vec![result.artifact_a, result.artifact_b],
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use ip_providers::{MockLlmReviewService, ReviewResult};
    use ip_store::InMemoryKnowledgeStore;
    use ip_types::{CandidateSource, CanonicalPairKey};

    fn seed_candidate(state: &mut State, a: &str, b: &str, similarity: f64) {
        state.upsert_candidate(
            CanonicalPairKey::new(a, b),
            "ws-backend",
            "ws-frontend",
            similarity,
            CoherenceCategory::Duplication,
            CandidateSource::Embedding,
            Some(true),
            None,
        );
    }

    #[tokio::test]
    async fn rate_limiter_caps_reviews_per_pass() {
        let mut state = State::new(0.75);
        seed_candidate(&mut state, "art-a", "art-b", 0.9);
        seed_candidate(&mut state, "art-c", "art-d", 0.9);

        let store = InMemoryKnowledgeStore::new();
        let config = CoherenceConfig::default();
        let rate_limiter = RateLimiter::new(1);
        let now = Instant::now();

        let review_service = MockLlmReviewService::new().with_review_results(vec![ReviewResult {
            artifact_a: "art-a".to_string(),
            artifact_b: "art-b".to_string(),
            confirmed: true,
            confidence: Confidence::High,
            severity: None,
            explanation: "confirmed duplication".to_string(),
        }]);

        let first = run_layer2_review(&mut state, &config, &review_service, &store, &rate_limiter, now).await;
        assert_eq!(first.len(), 1);

        let second = run_layer2_review(&mut state, &config, &review_service, &store, &rate_limiter, now).await;
        assert!(second.is_empty());
        assert_eq!(rate_limiter.remaining(now), 0);
    }

    #[tokio::test]
    async fn dismissal_is_idempotent_across_repeat_calls() {
        let mut state = State::new(0.75);
        seed_candidate(&mut state, "art-a", "art-b", 0.9);

        let store = InMemoryKnowledgeStore::new();
        let config = CoherenceConfig::default();
        let rate_limiter = RateLimiter::new(10);
        let now = Instant::now();

        let review_service = MockLlmReviewService::new().with_review_results(vec![ReviewResult {
            artifact_a: "art-a".to_string(),
            artifact_b: "art-b".to_string(),
            confirmed: true,
            confidence: Confidence::High,
            severity: None,
            explanation: "confirmed".to_string(),
        }]);

        let first = run_layer2_review(&mut state, &config, &review_service, &store, &rate_limiter, now).await;
        assert_eq!(first.len(), 1);
        let second = run_layer2_review(&mut state, &config, &review_service, &store, &rate_limiter, now).await;
        assert!(second.is_empty(), "candidate already dismissed; no more pending work");
    }

    #[tokio::test]
    async fn skip_layer2_for_embeddings_auto_confirms_without_calling_llm() {
        let mut state = State::new(0.75);
        seed_candidate(&mut state, "art-a", "art-b", 0.9);

        let store = InMemoryKnowledgeStore::new();
        let mut config = CoherenceConfig::default();
        config.skip_layer2_for_embeddings = true;
        let rate_limiter = RateLimiter::new(10);
        let now = Instant::now();
        let review_service = MockLlmReviewService::new();

        let events = run_layer2_review(&mut state, &config, &review_service, &store, &rate_limiter, now).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn low_confidence_results_are_dismissed_without_an_event() {
        let mut state = State::new(0.75);
        seed_candidate(&mut state, "art-a", "art-b", 0.9);

        let store = InMemoryKnowledgeStore::new();
        let config = CoherenceConfig::default();
        let rate_limiter = RateLimiter::new(10);
        let now = Instant::now();

        let review_service = MockLlmReviewService::new().with_review_results(vec![ReviewResult {
            artifact_a: "art-a".to_string(),
            artifact_b: "art-b".to_string(),
            confirmed: true,
            confidence: Confidence::Low,
            severity: None,
            explanation: "uncertain".to_string(),
        }]);

        let events = run_layer2_review(&mut state, &config, &review_service, &store, &rate_limiter, now).await;
        assert!(events.is_empty());
        let pair = CanonicalPairKey::new("art-a", "art-b");
        assert!(state.dismissed.contains(&pair));
    }
}
