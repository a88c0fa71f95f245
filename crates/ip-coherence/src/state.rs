//! Internal monitor state: path ownership, content-hash index, embedding
//! store, and the candidate table. Guarded as a unit by the monitor's
//! serialization mutex (spec §5).

use chrono::Utc;
use ip_providers::Vector;
use ip_types::{
    ArtifactKind, CandidateSource, CanonicalPairKey, CoherenceCandidate, CoherenceCategory,
    IdCounter, IssueCounter,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub(crate) struct ArtifactMeta {
    pub workstream: String,
    pub agent_id: String,
    pub kind: ArtifactKind,
    pub mime_type: Option<String>,
    pub content_hash: Option<String>,
}

pub(crate) struct State {
    /// sourcePath -> (agent_id, artifact_id, workstream)
    pub path_owners: HashMap<String, (String, String, String)>,
    pub artifacts: HashMap<String, ArtifactMeta>,
    /// artifact ids changed since the last Layer 1 scan.
    pub changed: HashSet<String>,
    /// contentHash -> (artifact_id, workstream, agent_id)
    pub content_hash_index: HashMap<String, Vec<(String, String, String)>>,
    pub embeddings: HashMap<String, (Vector, String)>,
    pub candidates: HashMap<CanonicalPairKey, CoherenceCandidate>,
    pub dismissed: HashSet<CanonicalPairKey>,
    /// pairs for which a CoherenceEvent has ever been emitted (spec §7:
    /// "issues appear only once per unordered artifact pair").
    pub emitted_pairs: HashSet<CanonicalPairKey>,
    pub last_scan_tick: u64,
    pub last_sweep_tick: Option<u64>,
    pub dirty_since_sweep: bool,
    pub candidate_ids: IdCounter,
    pub issue_ids: IssueCounter,
    /// current Layer 1 promotion threshold; mutated in place by the
    /// feedback loop (spec §4.5 auto-tuning).
    pub promotion_threshold: f64,
}

impl State {
    pub fn new(initial_promotion_threshold: f64) -> Self {
        Self {
            path_owners: HashMap::new(),
            artifacts: HashMap::new(),
            changed: HashSet::new(),
            content_hash_index: HashMap::new(),
            embeddings: HashMap::new(),
            candidates: HashMap::new(),
            dismissed: HashSet::new(),
            emitted_pairs: HashSet::new(),
            last_scan_tick: 0,
            last_sweep_tick: None,
            dirty_since_sweep: false,
            candidate_ids: IdCounter::new(),
            issue_ids: IssueCounter::new(),
            promotion_threshold: initial_promotion_threshold,
        }
    }

    /// Remove `artifact_id` from whatever content-hash bucket it was
    /// previously bound to (spec §4.5 Layer 1b: "rebind its entry").
    pub fn unbind_content_hash(&mut self, artifact_id: &str) {
        if let Some(meta) = self.artifacts.get(artifact_id) {
            if let Some(prev_hash) = meta.content_hash.clone() {
                if let Some(bucket) = self.content_hash_index.get_mut(&prev_hash) {
                    bucket.retain(|(id, _, _)| id != artifact_id);
                    if bucket.is_empty() {
                        self.content_hash_index.remove(&prev_hash);
                    }
                }
            }
        }
    }

    pub fn bind_content_hash(
        &mut self,
        hash: &str,
        artifact_id: &str,
        workstream: &str,
        agent_id: &str,
    ) {
        self.content_hash_index
            .entry(hash.to_string())
            .or_default()
            .push((artifact_id.to_string(), workstream.to_string(), agent_id.to_string()));
    }

    /// Insert or update the candidate for `pair`. Returns the resulting
    /// candidate and whether it was newly created. `force_promote`
    /// short-circuits the threshold comparison (Layer 1b always promotes
    /// at similarity 1.0; Layer 1 computes promotion from the current
    /// threshold).
    pub fn upsert_candidate(
        &mut self,
        pair: CanonicalPairKey,
        workstream_a: &str,
        workstream_b: &str,
        similarity: f64,
        category: CoherenceCategory,
        source: CandidateSource,
        force_promote: Option<bool>,
        explanation: Option<String>,
    ) -> (CoherenceCandidate, bool) {
        let threshold = self.promotion_threshold;
        if let Some(existing) = self.candidates.get_mut(&pair) {
            if similarity > existing.similarity_score {
                existing.similarity_score = similarity;
            }
            let promoted = force_promote.unwrap_or(existing.similarity_score >= threshold);
            existing.promoted_to_layer2 = existing.promoted_to_layer2 || promoted;
            existing.source = Some(source);
            if explanation.is_some() {
                existing.sweep_explanation = explanation;
            }
            return (existing.clone(), false);
        }
        let promoted = force_promote.unwrap_or(similarity >= threshold);
        let candidate = CoherenceCandidate {
            id: self.candidate_ids.next_candidate(),
            pair: pair.clone(),
            workstream_a: workstream_a.to_string(),
            workstream_b: workstream_b.to_string(),
            similarity_score: similarity,
            category,
            detected_at: Utc::now(),
            promoted_to_layer2: promoted,
            source: Some(source),
            sweep_explanation: explanation,
        };
        self.candidates.insert(pair, candidate.clone());
        (candidate, true)
    }
}
