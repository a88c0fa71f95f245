//! Layer 1c — periodic full-corpus LLM sweep (spec §4.5).

use crate::config::CoherenceConfig;
use crate::state::State;
use ip_providers::{LlmReviewService, SweepIssue, SweepRequest};
use ip_store::KnowledgeStore;
use ip_types::{CandidateSource, CanonicalPairKey, CoherenceCategory, CoherenceEvent, Severity};
use std::collections::{HashMap, HashSet};

pub(crate) fn should_run_layer1c_sweep(state: &State, config: &CoherenceConfig, current_tick: u64) -> bool {
    state.dirty_since_sweep
        && state
            .last_sweep_tick
            .is_none_or(|last| current_tick.saturating_sub(last) >= config.layer1c_scan_interval_ticks)
}

fn estimate_tokens(corpus: &HashMap<String, String>) -> usize {
    corpus.values().map(|c| c.len().div_ceil(4)).sum()
}

fn build_sweep_prompt(workstreams: &HashMap<String, String>) -> String {
    let mut by_workstream: HashMap<&str, Vec<&str>> = HashMap::new();
    for (artifact_id, workstream) in workstreams {
        by_workstream.entry(workstream.as_str()).or_default().push(artifact_id.as_str());
    }
    let mut sections: Vec<String> = by_workstream
        .into_iter()
        .map(|(workstream, ids)| format!("# {workstream}\n{}", ids.join(", ")))
        .collect();
    sections.sort();
    format!(
        "Review the following artifacts grouped by workstream. Identify duplication, \
         contradiction, gap, or dependency_violation relationships that cross workstream \
         boundaries only. Do not flag documentation-of-code relationships.\n\n{}",
        sections.join("\n\n")
    )
}

/// Runs one Layer 1c sweep. Returns newly emitted `CoherenceEvent`s (only
/// when Layer 2 is disabled; otherwise confirmed candidates surface via
/// Layer 2).
pub(crate) async fn run_layer1c_sweep(
    state: &mut State,
    config: &CoherenceConfig,
    sweep_service: &dyn LlmReviewService,
    store: &dyn KnowledgeStore,
    model: &str,
    current_tick: u64,
) -> Vec<CoherenceEvent> {
    state.last_sweep_tick = Some(current_tick);

    let artifacts = store.list_artifacts().await;
    let mut corpus = HashMap::new();
    let mut workstreams = HashMap::new();
    for artifact in &artifacts {
        if let Some(content) = store.get_artifact_content(&artifact.agent_id, &artifact.artifact_id).await {
            corpus.insert(artifact.artifact_id.clone(), content);
            workstreams.insert(artifact.artifact_id.clone(), artifact.workstream.clone());
        }
    }

    if estimate_tokens(&corpus) > config.layer1c_max_corpus_tokens {
        tracing::warn!("Layer 1c corpus exceeds token budget; skipping sweep with no fallback");
        state.dirty_since_sweep = false;
        return Vec::new();
    }

    let prompt = build_sweep_prompt(&workstreams);
    let request = SweepRequest {
        corpus,
        workstreams: workstreams.clone(),
        prompt,
        model: model.to_string(),
    };

    state.dirty_since_sweep = false;

    let issues = match sweep_service.sweep_corpus(request).await {
        Ok(issues) => issues,
        Err(err) => {
            tracing::warn!(error = %err, "Layer 1c sweep call failed; no issues surfaced");
            return Vec::new();
        }
    };

    let mut seen_pairs: HashSet<CanonicalPairKey> = HashSet::new();
    let mut events = Vec::new();

    for issue in issues {
        let SweepIssue { artifact_a, artifact_b, category, explanation } = issue;
        if artifact_a == artifact_b {
            continue;
        }
        let workstream_a = workstreams.get(&artifact_a).cloned();
        let workstream_b = workstreams.get(&artifact_b).cloned();
        let (Some(workstream_a), Some(workstream_b)) = (workstream_a, workstream_b) else {
            continue;
        };
        if workstream_a == workstream_b {
            continue;
        }
        let pair = CanonicalPairKey::new(&artifact_a, &artifact_b);
        if state.emitted_pairs.contains(&pair) || !seen_pairs.insert(pair.clone()) {
            continue;
        }

        // Both an upgraded embedding-sourced candidate and a brand new
        // sweep-sourced one are promoted: a sweep hit is itself evidence
        // worth a Layer 2 look, whether or not embeddings had already
        // flagged the pair.
        state.upsert_candidate(
            pair.clone(),
            &workstream_a,
            &workstream_b,
            0.0,
            category,
            CandidateSource::Sweep,
            Some(true),
            Some(explanation.clone()),
        );

        if !config.enable_layer2 {
            state.emitted_pairs.insert(pair);
            events.push(CoherenceEvent {
                id: state.issue_ids.next(),
                title: format!("{category:?}: {artifact_a} / {artifact_b}"),
                description: explanation,
                category,
                severity: Severity::Medium,
                affected_workstreams: [workstream_a, workstream_b].into_iter().collect(),
                affected_artifact_ids: vec![artifact_a, artifact_b],
            });
        }
    }

    events
}
