//! Artifact events: immutable records produced by an agent (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Document,
    Design,
    Config,
    Test,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Draft,
    InReview,
    Approved,
    Rejected,
}

/// Creator, timestamp, and optional lineage for an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub source_path: Option<String>,
    pub source_artifact_ids: Vec<String>,
}

/// Immutable record produced by an agent.
///
/// Artifact content itself is stored separately and retrieved by
/// `(agent_id, artifact_id)` through the knowledge store collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEvent {
    pub artifact_id: String,
    pub agent_id: String,
    pub workstream: String,
    pub kind: ArtifactKind,
    pub status: ArtifactStatus,
    pub mime_type: Option<String>,
    pub content_hash: Option<String>,
    pub quality_score: Option<f64>,
    pub provenance: Provenance,
}

impl ArtifactEvent {
    /// True when the mime type (if present) is clearly textual.
    pub fn is_text_mime(&self) -> bool {
        match &self.mime_type {
            None => true,
            Some(m) => m.starts_with("text/") || m == "application/json",
        }
    }
}
