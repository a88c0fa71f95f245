//! Per-agent trust state (spec §3, §4.3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainTrust {
    pub score: i32,
    pub decay_accumulator: f64,
    pub last_activity_tick: u64,
}

/// Per-agent trust record. Global score plus a lazily-populated
/// per-domain (artifact kind) map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTrustState {
    pub agent_id: String,
    pub global_score: i32,
    pub last_activity_tick: u64,
    pub decay_accumulator: f64,
    pub idle_ticks: u64,
    pub domains: HashMap<String, DomainTrust>,
}

/// A point-in-time read of an agent's global score, for the WebSocket
/// broadcast contract (§6.4: `{agentId, score}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustSnapshot {
    pub agent_id: String,
    pub score: i32,
}

/// One row of the calibration log, appended when an engine runs in
/// calibration mode instead of mutating state (§4.3 step 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationLogEntry {
    pub agent_id: String,
    pub tick: u64,
    pub outcome: String,
    pub base_delta: i32,
    pub effective_delta: i32,
    pub would_be_score: i32,
}
