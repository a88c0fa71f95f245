//! Outcome kinds and the default delta table (spec §4.3).

use ip_types::{DecisionEvent, DecisionPayload, HumanResolution};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    HumanApprovesRecommendedOption,
    HumanApprovesToolCall,
    HumanApprovesAlways,
    HumanPicksNonRecommended,
    HumanModifiesToolArgs,
    HumanRejectsToolCall,
    HumanOverridesAgentDecision,
    TaskCompletedClean,
    TaskCompletedPartial,
    TaskAbandonedOrMaxTurns,
    ErrorEvent,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::HumanApprovesRecommendedOption => "human_approves_recommended_option",
            OutcomeKind::HumanApprovesToolCall => "human_approves_tool_call",
            OutcomeKind::HumanApprovesAlways => "human_approves_always",
            OutcomeKind::HumanPicksNonRecommended => "human_picks_non_recommended",
            OutcomeKind::HumanModifiesToolArgs => "human_modifies_tool_args",
            OutcomeKind::HumanRejectsToolCall => "human_rejects_tool_call",
            OutcomeKind::HumanOverridesAgentDecision => "human_overrides_agent_decision",
            OutcomeKind::TaskCompletedClean => "task_completed_clean",
            OutcomeKind::TaskCompletedPartial => "task_completed_partial",
            OutcomeKind::TaskAbandonedOrMaxTurns => "task_abandoned_or_max_turns",
            OutcomeKind::ErrorEvent => "error_event",
        };
        write!(f, "{s}")
    }
}

/// Default outcome -> delta table (spec §4.3).
pub fn default_deltas() -> HashMap<OutcomeKind, i32> {
    use OutcomeKind::*;
    HashMap::from([
        (HumanApprovesRecommendedOption, 2),
        (HumanApprovesToolCall, 1),
        (HumanApprovesAlways, 3),
        (HumanPicksNonRecommended, -1),
        (HumanModifiesToolArgs, -1),
        (HumanRejectsToolCall, -2),
        (HumanOverridesAgentDecision, -3),
        (TaskCompletedClean, 3),
        (TaskCompletedPartial, 1),
        (TaskAbandonedOrMaxTurns, -1),
        (ErrorEvent, -2),
    ])
}

/// Map a human resolution to a trust outcome (spec §4.3, final
/// paragraph).
pub fn resolution_to_outcome(decision: &DecisionEvent, resolution: &HumanResolution) -> OutcomeKind {
    match (&decision.payload, resolution) {
        (DecisionPayload::Option(opt), HumanResolution::OptionChosen { option_id }) => {
            match &opt.recommended_option_id {
                Some(recommended) if recommended == option_id => {
                    OutcomeKind::HumanApprovesRecommendedOption
                }
                _ => OutcomeKind::HumanPicksNonRecommended,
            }
        }
        (DecisionPayload::ToolApproval(_), HumanResolution::ToolApprove { always: true }) => {
            OutcomeKind::HumanApprovesAlways
        }
        (DecisionPayload::ToolApproval(_), HumanResolution::ToolApprove { always: false }) => {
            OutcomeKind::HumanApprovesToolCall
        }
        (DecisionPayload::ToolApproval(_), HumanResolution::ToolReject) => {
            OutcomeKind::HumanRejectsToolCall
        }
        (DecisionPayload::ToolApproval(_), HumanResolution::ToolModify { .. }) => {
            OutcomeKind::HumanModifiesToolArgs
        }
        // Mismatched payload/resolution shapes shouldn't reach the trust
        // engine (the HTTP boundary validates this); treat as an override
        // rather than panicking.
        _ => OutcomeKind::HumanOverridesAgentDecision,
    }
}
