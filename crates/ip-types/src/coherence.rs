//! Coherence candidates and issues (spec §3, §4.5).

use crate::decision::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoherenceCategory {
    Duplication,
    Contradiction,
    Gap,
    DependencyViolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Embedding,
    Sweep,
}

/// Canonical (sorted) key for an unordered artifact pair. At most one
/// candidate exists per pair at any time (spec §3 invariant).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalPairKey(pub String, pub String);

impl CanonicalPairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceCandidate {
    pub id: crate::ids::CandidateId,
    pub pair: CanonicalPairKey,
    pub workstream_a: String,
    pub workstream_b: String,
    pub similarity_score: f64,
    pub category: CoherenceCategory,
    pub detected_at: DateTime<Utc>,
    pub promoted_to_layer2: bool,
    pub source: Option<CandidateSource>,
    pub sweep_explanation: Option<String>,
}

/// A surfaced, human-visible issue. Append-only: never deleted once
/// emitted (spec §3 lifecycles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceEvent {
    pub id: crate::ids::IssueId,
    pub title: String,
    pub description: String,
    pub category: CoherenceCategory,
    pub severity: Severity,
    pub affected_workstreams: BTreeSet<String>,
    pub affected_artifact_ids: Vec<String>,
}
