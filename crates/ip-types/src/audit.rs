//! Append-only audit log entries (spec §3, §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only audit log entry. Carries the logical `tick` it was
/// recorded at (not just a wall-clock timestamp) because every analyzer
/// in §4.6 windows and buckets by tick, not by time — under manual tick
/// mode wall-clock ordering and tick ordering can diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub caller_agent_id: Option<String>,
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

impl AuditLogEntry {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: impl Into<String>,
        caller_agent_id: Option<String>,
        tick: u64,
        details: serde_json::Value,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action: action.into(),
            caller_agent_id,
            tick,
            timestamp: Utc::now(),
            details,
        }
    }
}
