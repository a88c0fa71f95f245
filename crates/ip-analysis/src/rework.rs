//! Rework causal linker (spec §4.6): for each artifact update, attributes
//! it to the closest prior trigger within a 10-tick lookback window —
//! a coherence issue affecting the artifact, an override touching it, a
//! cascade from another artifact's update, or otherwise a voluntary
//! improvement with no identifiable external trigger.

use crate::schema::{artifact_update, coherence_issue, is_override_outcome, trust_outcome};
use ip_types::AuditLogEntry;
use serde::{Deserialize, Serialize};

const LOOKBACK_TICKS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Trigger {
    CoherenceIssue { issue_id: String, tick: u64 },
    Override { tick: u64 },
    Cascade { trigger_artifact_id: String, tick: u64 },
    VoluntaryImprovement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReworkLink {
    pub artifact_id: String,
    pub tick: u64,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReworkRates {
    pub total: u64,
    pub coherence_triggered: u64,
    pub override_triggered: u64,
    pub cascade_triggered: u64,
    pub voluntary: u64,
}

impl ReworkRates {
    pub fn coherence_rate(&self) -> f64 {
        ratio(self.coherence_triggered, self.total)
    }

    pub fn override_rate(&self) -> f64 {
        ratio(self.override_triggered, self.total)
    }

    pub fn cascade_rate(&self) -> f64 {
        ratio(self.cascade_triggered, self.total)
    }

    pub fn voluntary_rate(&self) -> f64 {
        ratio(self.voluntary, self.total)
    }
}

fn ratio(n: u64, d: u64) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

struct UpdateEvent {
    artifact_id: String,
    tick: u64,
}

struct OverrideEvent {
    artifact_id: String,
    tick: u64,
}

struct CoherenceEvent {
    issue_id: String,
    tick: u64,
    artifact_ids: Vec<String>,
}

pub fn link_rework(entries: &[AuditLogEntry]) -> (Vec<ReworkLink>, ReworkRates) {
    let mut updates = Vec::new();
    let mut overrides = Vec::new();
    let mut issues = Vec::new();

    for entry in entries {
        if artifact_update(entry).is_some() {
            updates.push(UpdateEvent { artifact_id: entry.entity_id.clone(), tick: entry.tick });
            continue;
        }
        if let Some(details) = trust_outcome(entry) {
            if is_override_outcome(&details.outcome) {
                if let Some(artifact_id) = details.affected_artifact_id {
                    overrides.push(OverrideEvent { artifact_id, tick: entry.tick });
                }
            }
            continue;
        }
        if let Some(details) = coherence_issue(entry) {
            issues.push(CoherenceEvent {
                issue_id: entry.entity_id.clone(),
                tick: entry.tick,
                artifact_ids: details.affected_artifact_ids,
            });
        }
    }

    let mut links = Vec::with_capacity(updates.len());
    let mut rates = ReworkRates::default();

    for update in &updates {
        let window_start = update.tick.saturating_sub(LOOKBACK_TICKS);
        let in_window = |tick: u64| tick < update.tick && tick >= window_start;

        let closest_issue = issues
            .iter()
            .filter(|issue| in_window(issue.tick) && issue.artifact_ids.contains(&update.artifact_id))
            .max_by_key(|issue| issue.tick);

        let closest_override = overrides
            .iter()
            .filter(|o| in_window(o.tick) && o.artifact_id == update.artifact_id)
            .max_by_key(|o| o.tick);

        let closest_cascade = updates
            .iter()
            .filter(|other| in_window(other.tick) && other.artifact_id != update.artifact_id)
            .max_by_key(|other| other.tick);

        let trigger = if let Some(issue) = closest_issue {
            rates.coherence_triggered += 1;
            Trigger::CoherenceIssue { issue_id: issue.issue_id.clone(), tick: issue.tick }
        } else if let Some(o) = closest_override {
            rates.override_triggered += 1;
            Trigger::Override { tick: o.tick }
        } else if let Some(cascade) = closest_cascade {
            rates.cascade_triggered += 1;
            Trigger::Cascade { trigger_artifact_id: cascade.artifact_id.clone(), tick: cascade.tick }
        } else {
            rates.voluntary += 1;
            Trigger::VoluntaryImprovement
        };

        rates.total += 1;
        links.push(ReworkLink { artifact_id: update.artifact_id.clone(), tick: update.tick, trigger });
    }

    (links, rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update_entry(artifact_id: &str, tick: u64, workstream: &str) -> AuditLogEntry {
        AuditLogEntry::new(
            "artifact",
            artifact_id,
            "artifact_update",
            None,
            tick,
            json!({ "workstream": workstream, "agent_id": "agent-1" }),
        )
    }

    fn coherence_entry(issue_id: &str, tick: u64, artifact_ids: &[&str]) -> AuditLogEntry {
        AuditLogEntry::new(
            "coherence",
            issue_id,
            "issue_emitted",
            None,
            tick,
            json!({
                "category": "contradiction",
                "severity": "high",
                "affected_workstreams": ["ws-a", "ws-b"],
                "affected_artifact_ids": artifact_ids,
            }),
        )
    }

    fn override_entry(artifact_id: &str, tick: u64) -> AuditLogEntry {
        AuditLogEntry::new(
            "trust",
            "agent-1",
            "trust_outcome",
            None,
            tick,
            json!({
                "outcome": "human_overrides_agent_decision",
                "effective_delta": -3,
                "workstream": null,
                "artifact_kind": null,
                "tool_category": null,
                "affected_artifact_id": artifact_id,
            }),
        )
    }

    #[test]
    fn coherence_issue_outranks_override_and_cascade() {
        let entries = vec![
            update_entry("art-2", 1, "ws-b"),
            coherence_entry("issue-1", 3, &["art-1"]),
            override_entry("art-1", 4),
            update_entry("art-1", 9, "ws-a"),
        ];

        let (links, rates) = link_rework(&entries);
        let link = links.iter().find(|l| l.artifact_id == "art-1" && l.tick == 9).unwrap();
        assert!(matches!(link.trigger, Trigger::CoherenceIssue { .. }));
        assert_eq!(rates.coherence_triggered, 1);
    }

    #[test]
    fn override_outranks_cascade_when_no_coherence_issue() {
        let entries = vec![
            update_entry("art-2", 2, "ws-b"),
            override_entry("art-1", 5),
            update_entry("art-1", 9, "ws-a"),
        ];

        let (links, _) = link_rework(&entries);
        let link = links.iter().find(|l| l.artifact_id == "art-1").unwrap();
        assert!(matches!(link.trigger, Trigger::Override { .. }));
    }

    #[test]
    fn another_artifacts_update_is_a_cascade() {
        let entries = vec![update_entry("art-2", 2, "ws-b"), update_entry("art-1", 9, "ws-a")];

        let (links, rates) = link_rework(&entries);
        let link = links.iter().find(|l| l.artifact_id == "art-1").unwrap();
        assert!(matches!(&link.trigger, Trigger::Cascade { trigger_artifact_id, .. } if trigger_artifact_id == "art-2"));
        assert_eq!(rates.cascade_triggered, 1);
    }

    #[test]
    fn no_trigger_in_window_is_voluntary() {
        let entries = vec![update_entry("art-1", 50, "ws-a")];
        let (links, rates) = link_rework(&entries);
        assert!(matches!(links[0].trigger, Trigger::VoluntaryImprovement));
        assert_eq!(rates.voluntary, 1);
    }

    #[test]
    fn trigger_outside_lookback_window_is_ignored() {
        let entries = vec![override_entry("art-1", 1), update_entry("art-1", 15, "ws-a")];
        let (links, _) = link_rework(&entries);
        assert!(matches!(links[0].trigger, Trigger::VoluntaryImprovement));
    }
}
