//! Layer 1 — periodic embedding similarity scan, and Layer 1b — the
//! content-hash fast path that rides along after it (spec §4.5).

use crate::config::CoherenceConfig;
use crate::state::{ArtifactMeta, State};
use ip_providers::{cosine_similarity, EmbeddingService};
use ip_store::KnowledgeStore;
use ip_types::{ArtifactKind, CandidateSource, CanonicalPairKey, CoherenceCategory, CoherenceEvent, Severity};
use std::collections::HashSet;

fn is_embeddable(kind: ArtifactKind, mime_type: &Option<String>) -> bool {
    let is_text_or_json = match mime_type {
        None => true,
        Some(m) => m.starts_with("text/") || m == "application/json",
    };
    match kind {
        ArtifactKind::Design => false,
        ArtifactKind::Code | ArtifactKind::Config | ArtifactKind::Test | ArtifactKind::Document => {
            is_text_or_json
        }
        ArtifactKind::Other => matches!(mime_type.as_deref(), Some(m) if m.starts_with("text/")),
    }
}

pub(crate) fn should_run_layer1_scan(state: &State, config: &CoherenceConfig, current_tick: u64) -> bool {
    !state.changed.is_empty()
        && current_tick.saturating_sub(state.last_scan_tick) >= config.layer1_scan_interval_ticks
}

/// Runs one Layer 1 scan followed immediately by the Layer 1b content-hash
/// pass over the same drained changed-set. Returns newly emitted advisory
/// `CoherenceEvent`s.
pub(crate) async fn run_layer1_scan(
    state: &mut State,
    config: &CoherenceConfig,
    embedding: &dyn EmbeddingService,
    store: &dyn KnowledgeStore,
    current_tick: u64,
) -> Vec<CoherenceEvent> {
    let full_changed: HashSet<String> = state.changed.drain().collect();
    state.last_scan_tick = current_tick;

    let mut embeddable: Vec<String> = full_changed
        .iter()
        .filter(|id| {
            state
                .artifacts
                .get(*id)
                .map(|meta| is_embeddable(meta.kind, &meta.mime_type))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    embeddable.sort();
    embeddable.truncate(config.layer1_max_artifacts_per_scan);

    let mut ids_with_content = Vec::with_capacity(embeddable.len());
    let mut contents = Vec::with_capacity(embeddable.len());
    for id in &embeddable {
        let meta = state.artifacts.get(id).cloned();
        let Some(meta) = meta else { continue };
        if let Some(content) = store.get_artifact_content(&meta.agent_id, id).await {
            ids_with_content.push((id.clone(), meta));
            contents.push(content);
        } else {
            tracing::warn!(artifact_id = %id, "no content available for Layer 1 embedding");
        }
    }

    let mut events = Vec::new();

    if !contents.is_empty() {
        match embedding.embed_batch(&contents).await {
            Ok(vectors) => {
                for ((artifact_id, meta), vector) in ids_with_content.iter().zip(vectors.into_iter()) {
                    state
                        .embeddings
                        .insert(artifact_id.clone(), (vector, meta.workstream.clone()));
                }
                for (artifact_id, _meta) in &ids_with_content {
                    let (vector_a, workstream_a) = state.embeddings.get(artifact_id).unwrap().clone();
                    let others: Vec<(String, ip_providers::Vector, String)> = state
                        .embeddings
                        .iter()
                        .filter(|(id, (_, ws))| *id != artifact_id && **ws != workstream_a)
                        .map(|(id, (v, ws))| (id.clone(), v.clone(), ws.clone()))
                        .collect();
                    for (other_id, vector_b, workstream_b) in others {
                        let similarity = cosine_similarity(&vector_a, &vector_b);
                        if similarity < config.layer1_advisory_threshold {
                            continue;
                        }
                        let pair = CanonicalPairKey::new(artifact_id, &other_id);
                        let (candidate, is_new) = state.upsert_candidate(
                            pair.clone(),
                            &workstream_a,
                            &workstream_b,
                            similarity,
                            CoherenceCategory::Duplication,
                            CandidateSource::Embedding,
                            None,
                            None,
                        );
                        if is_new
                            && !candidate.promoted_to_layer2
                            && !state.emitted_pairs.contains(&pair)
                        {
                            state.emitted_pairs.insert(pair);
                            events.push(CoherenceEvent {
                                id: state.issue_ids.next(),
                                title: format!("Advisory: possible duplication between {artifact_id} and {other_id}"),
                                description: format!(
                                    "Embedding similarity {similarity:.2} between {artifact_id} ({workstream_a}) and {other_id} ({workstream_b})"
                                ),
                                category: CoherenceCategory::Duplication,
                                severity: Severity::Low,
                                affected_workstreams: [workstream_a.clone(), workstream_b.clone()].into_iter().collect(),
                                affected_artifact_ids: vec![artifact_id.clone(), other_id.clone()],
                            });
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Layer 1 embedding batch call failed; skipping scan");
            }
        }
    }

    events.extend(run_layer1b(state, &full_changed));
    events
}

/// Layer 1b: for every changed artifact with a non-empty content hash,
/// upsert a promoted duplication candidate against every other bound
/// artifact whose workstream *and* agent both differ.
fn run_layer1b(state: &mut State, full_changed: &HashSet<String>) -> Vec<CoherenceEvent> {
    for artifact_id in full_changed {
        let Some(meta) = state.artifacts.get(artifact_id).cloned() else { continue };
        let Some(hash) = meta.content_hash.clone() else { continue };
        if hash.is_empty() {
            continue;
        }
        let bucket = state.content_hash_index.get(&hash).cloned().unwrap_or_default();
        for (other_id, other_workstream, other_agent) in bucket {
            if &other_id == artifact_id {
                continue;
            }
            if other_workstream == meta.workstream || other_agent == meta.agent_id {
                continue;
            }
            let pair = CanonicalPairKey::new(artifact_id, &other_id);
            state.upsert_candidate(
                pair,
                &meta.workstream,
                &other_workstream,
                1.0,
                CoherenceCategory::Duplication,
                CandidateSource::Embedding,
                Some(true),
                None,
            );
        }
    }
    // Layer 1b never emits CoherenceEvents directly; it only shapes the
    // candidate table consumed by Layer 2.
    Vec::new()
}
