//! Override-pattern analyzer (spec §4.6): groups override-flavored trust
//! outcomes by workstream, artifact kind, tool category, and agent, and
//! flags temporal bursts — windows of 5 ticks with more than 3 overrides.

use crate::schema::{is_override_outcome, trust_outcome};
use ip_types::AuditLogEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverrideGroupKey {
    pub workstream: Option<String>,
    pub artifact_kind: Option<String>,
    pub tool_category: Option<String>,
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideGroup {
    pub key: OverrideGroupKey,
    pub count: u64,
}

/// A 5-tick window containing more than 3 overrides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TemporalBurst {
    pub start_tick: u64,
    pub end_tick: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverridePatternReport {
    pub groups: Vec<OverrideGroup>,
    pub temporal_bursts: Vec<TemporalBurst>,
}

const BURST_WINDOW_TICKS: u64 = 5;
const BURST_THRESHOLD: u64 = 3;

pub fn analyze_override_patterns(entries: &[AuditLogEntry]) -> OverridePatternReport {
    let mut groups: HashMap<OverrideGroupKey, u64> = HashMap::new();
    let mut override_ticks: Vec<u64> = Vec::new();

    for entry in entries {
        let Some(details) = trust_outcome(entry) else { continue };
        if !is_override_outcome(&details.outcome) {
            continue;
        }
        override_ticks.push(entry.tick);
        *groups
            .entry(OverrideGroupKey {
                workstream: details.workstream,
                artifact_kind: details.artifact_kind,
                tool_category: details.tool_category,
                agent_id: entry.entity_id.clone(),
            })
            .or_insert(0) += 1;
    }

    let mut groups: Vec<OverrideGroup> =
        groups.into_iter().map(|(key, count)| OverrideGroup { key, count }).collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count));

    OverridePatternReport { groups, temporal_bursts: detect_temporal_bursts(&override_ticks) }
}

/// Non-overlapping scan: once a burst window is reported its ticks are
/// consumed, so a long run of overrides doesn't produce one burst per
/// starting tick.
fn detect_temporal_bursts(ticks: &[u64]) -> Vec<TemporalBurst> {
    let mut sorted = ticks.to_vec();
    sorted.sort_unstable();

    let mut bursts = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let end = start + BURST_WINDOW_TICKS - 1;
        let mut j = i;
        while j < sorted.len() && sorted[j] <= end {
            j += 1;
        }
        let count = (j - i) as u64;
        if count > BURST_THRESHOLD {
            bursts.push(TemporalBurst { start_tick: start, end_tick: end, count });
            i = j;
        } else {
            i += 1;
        }
    }
    bursts
}
