//! Audit-log entry shapes the analyzers agree on with the rest of the
//! Intelligence Plane (spec §4.6). The audit log itself is untyped
//! (`serde_json::Value` details, per `AuditLogEntry`), so the analyzers
//! need a fixed convention for which `entity_type`/`action` pairs carry
//! which payload — this module is that convention, shared by whichever
//! collaborator writes the entries (the trust engine, the coherence
//! monitor, the decision queue, the server's control-mode switch) and by
//! every analyzer reading them back.

use ip_types::AuditLogEntry;
use serde::{Deserialize, Serialize};

pub const ENTITY_TRUST: &str = "trust";
pub const ACTION_TRUST_OUTCOME: &str = "trust_outcome";

pub const ENTITY_ARTIFACT: &str = "artifact";
pub const ACTION_ARTIFACT_UPDATE: &str = "artifact_update";

pub const ENTITY_COHERENCE: &str = "coherence";
pub const ACTION_ISSUE_EMITTED: &str = "issue_emitted";

pub const ENTITY_CONTROL_MODE: &str = "control_mode";
pub const ACTION_CONTROL_MODE_CHANGE: &str = "control_mode_change";

/// Payload of a `trust`/`trust_outcome` entry. `entity_id` on the entry
/// itself is the agent the outcome was recorded against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustOutcomeDetails {
    /// `OutcomeKind`'s `Display` string, e.g. `"human_overrides_agent_decision"`.
    pub outcome: String,
    pub effective_delta: i32,
    pub workstream: Option<String>,
    pub artifact_kind: Option<String>,
    pub tool_category: Option<String>,
    /// The artifact the underlying decision concerned, if any — lets the
    /// rework causal linker connect an override to the update it shaped.
    pub affected_artifact_id: Option<String>,
}

/// Payload of an `artifact`/`artifact_update` entry. `entity_id` on the
/// entry itself is the artifact id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactUpdateDetails {
    pub workstream: String,
    pub agent_id: String,
}

/// Payload of a `coherence`/`issue_emitted` entry. `entity_id` on the
/// entry itself is the issue id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceIssueDetails {
    pub category: String,
    pub severity: String,
    pub affected_workstreams: Vec<String>,
    pub affected_artifact_ids: Vec<String>,
}

/// Payload of a `control_mode`/`control_mode_change` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlModeChangeDetails {
    pub mode: String,
}

/// An outcome name "contains override, or equals `human_picks_non_recommended`"
/// (spec §4.6's override-pattern analyzer).
pub fn is_override_outcome(outcome: &str) -> bool {
    outcome.contains("override") || outcome == "human_picks_non_recommended"
}

pub fn trust_outcome(entry: &AuditLogEntry) -> Option<TrustOutcomeDetails> {
    if entry.entity_type != ENTITY_TRUST || entry.action != ACTION_TRUST_OUTCOME {
        return None;
    }
    serde_json::from_value(entry.details.clone()).ok()
}

pub fn artifact_update(entry: &AuditLogEntry) -> Option<ArtifactUpdateDetails> {
    if entry.entity_type != ENTITY_ARTIFACT || entry.action != ACTION_ARTIFACT_UPDATE {
        return None;
    }
    serde_json::from_value(entry.details.clone()).ok()
}

pub fn coherence_issue(entry: &AuditLogEntry) -> Option<CoherenceIssueDetails> {
    if entry.entity_type != ENTITY_COHERENCE || entry.action != ACTION_ISSUE_EMITTED {
        return None;
    }
    serde_json::from_value(entry.details.clone()).ok()
}

pub fn control_mode_change(entry: &AuditLogEntry) -> Option<ControlModeChangeDetails> {
    if entry.entity_type != ENTITY_CONTROL_MODE || entry.action != ACTION_CONTROL_MODE_CHANGE {
        return None;
    }
    serde_json::from_value(entry.details.clone()).ok()
}
