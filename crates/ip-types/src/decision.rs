//! Decision events: questions the Intelligence Plane cannot auto-resolve
//! (spec §3, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlastRadius {
    Trivial,
    Small,
    Medium,
    Large,
    Unknown,
}

/// What happens to a decision when its deadline passes without a human
/// resolution (§4.4's `autoResolve` policy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoResolvePolicy {
    pub action_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDecision {
    pub options: Vec<DecisionOption>,
    pub recommended_option_id: Option<String>,
    pub auto_resolve: Option<AutoResolvePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolApprovalDecision {
    pub tool_name: String,
    pub tool_args: serde_json::Value,
    /// Whether the pending invocation may be modified rather than only
    /// allowed/denied.
    pub modifiable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionPayload {
    Option(OptionDecision),
    ToolApproval(ToolApprovalDecision),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub decision_id: String,
    pub agent_id: String,
    pub workstream: String,
    pub affected_artifact_id: Option<String>,
    pub severity: Severity,
    pub blast_radius: BlastRadius,
    pub due_by_tick: Option<u64>,
    pub payload: DecisionPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Resolved,
    TimedOut,
    AutoResolved,
}

/// What resolution action a human took, and how it maps to a trust outcome
/// (§4.3 "mapping a human resolution to an outcome").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HumanResolution {
    OptionChosen { option_id: String },
    ToolApprove { always: bool },
    ToolReject,
    ToolModify { new_args: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub resolution: HumanResolution,
    pub resolved_at_tick: u64,
}

/// A decision as tracked by the queue: the event plus queueing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedDecision {
    pub event: DecisionEvent,
    pub status: DecisionStatus,
    pub enqueued_tick: u64,
    pub deadline_tick: Option<u64>,
    pub resolution: Option<ResolutionRecord>,
}

impl QueuedDecision {
    pub fn is_pending(&self) -> bool {
        self.status == DecisionStatus::Pending
    }
}
