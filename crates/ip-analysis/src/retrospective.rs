//! Retrospective service (spec §4.6): summarizes a tick window, optionally
//! against the window immediately preceding it, into counts, a handful of
//! insights, and suggested policy adjustments.

use crate::override_pattern::analyze_override_patterns;
use crate::schema::{artifact_update, coherence_issue, is_override_outcome, trust_outcome};
use ip_types::AuditLogEntry;
use serde::{Deserialize, Serialize};

const MAX_INSIGHTS: usize = 5;
const OVERRIDE_RATE_THRESHOLD: f64 = 0.3;
const COHERENCE_COUNT_THRESHOLD: u64 = 3;

#[derive(Debug, Clone, Copy)]
pub struct TickWindow {
    pub start_tick: u64,
    pub end_tick: u64,
}

impl TickWindow {
    pub fn contains(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick < self.end_tick
    }

    /// The window of equal length immediately preceding this one.
    pub fn preceding(&self) -> TickWindow {
        let len = self.end_tick - self.start_tick;
        TickWindow { start_tick: self.start_tick.saturating_sub(len), end_tick: self.start_tick }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrospectiveReport {
    pub decisions: u64,
    pub overrides: u64,
    pub coherence_issues: u64,
    pub artifact_updates: u64,
    pub positive_outcomes: u64,
    pub negative_outcomes: u64,
    pub neutral_outcomes: u64,
    pub insights: Vec<String>,
    pub suggested_adjustments: Vec<String>,
}

struct WindowCounts {
    decisions: u64,
    overrides: u64,
    coherence_issues: u64,
    artifact_updates: u64,
    positive_outcomes: u64,
    negative_outcomes: u64,
    neutral_outcomes: u64,
}

fn count_window(entries: &[AuditLogEntry], window: TickWindow) -> WindowCounts {
    let mut counts = WindowCounts {
        decisions: 0,
        overrides: 0,
        coherence_issues: 0,
        artifact_updates: 0,
        positive_outcomes: 0,
        negative_outcomes: 0,
        neutral_outcomes: 0,
    };

    for entry in entries.iter().filter(|e| window.contains(e.tick)) {
        if let Some(details) = trust_outcome(entry) {
            counts.decisions += 1;
            if is_override_outcome(&details.outcome) {
                counts.overrides += 1;
            }
            match details.effective_delta.cmp(&0) {
                std::cmp::Ordering::Greater => counts.positive_outcomes += 1,
                std::cmp::Ordering::Less => counts.negative_outcomes += 1,
                std::cmp::Ordering::Equal => counts.neutral_outcomes += 1,
            }
        } else if coherence_issue(entry).is_some() {
            counts.coherence_issues += 1;
        } else if artifact_update(entry).is_some() {
            counts.artifact_updates += 1;
        }
    }

    counts
}

pub fn retrospective(
    entries: &[AuditLogEntry],
    window: TickWindow,
    compare_to_preceding: bool,
) -> RetrospectiveReport {
    let current = count_window(entries, window);
    let override_rate = ratio(current.overrides, current.decisions);

    let mut insights = Vec::new();
    let windowed_entries: Vec<AuditLogEntry> =
        entries.iter().filter(|e| window.contains(e.tick)).cloned().collect();
    let override_report = analyze_override_patterns(&windowed_entries);

    if override_rate > OVERRIDE_RATE_THRESHOLD {
        insights.push(format!(
            "override rate {:.0}% exceeds 30% of decisions this window",
            override_rate * 100.0
        ));
    }

    if let Some(top) = override_report.groups.first() {
        if top.count > 0 {
            insights.push(format!(
                "agent {} accounts for {} override(s), the most of any agent this window",
                top.key.agent_id, top.count
            ));
        }
    }

    if let Some(burst) = override_report.temporal_bursts.first() {
        insights.push(format!(
            "override burst between ticks {} and {} ({} overrides)",
            burst.start_tick, burst.end_tick, burst.count
        ));
    }

    if compare_to_preceding {
        let preceding = count_window(entries, window.preceding());
        if current.coherence_issues != preceding.coherence_issues {
            let direction = if current.coherence_issues > preceding.coherence_issues {
                "increased"
            } else {
                "decreased"
            };
            insights.push(format!(
                "coherence issues {direction} from {} to {} versus the preceding window",
                preceding.coherence_issues, current.coherence_issues
            ));
        }
    }

    let trust_majority_negative = current.negative_outcomes > current.positive_outcomes + current.neutral_outcomes;
    if trust_majority_negative {
        insights.push("a majority of trust outcomes this window were negative".to_string());
    }

    insights.truncate(MAX_INSIGHTS);

    let mut suggested_adjustments = Vec::new();
    if override_rate > OVERRIDE_RATE_THRESHOLD {
        suggested_adjustments
            .push("review the agents and tools driving overrides before raising their autonomy".to_string());
    }
    if current.coherence_issues > COHERENCE_COUNT_THRESHOLD {
        suggested_adjustments
            .push("revisit workstream boundaries or the Layer 1 promotion threshold".to_string());
    }
    if trust_majority_negative {
        suggested_adjustments.push("hold or lower control mode until trust outcomes recover".to_string());
    }

    if !suggested_adjustments.is_empty() {
        tracing::info!(
            start_tick = window.start_tick,
            end_tick = window.end_tick,
            adjustments = suggested_adjustments.len(),
            "retrospective surfaced policy adjustments"
        );
    }

    RetrospectiveReport {
        decisions: current.decisions,
        overrides: current.overrides,
        coherence_issues: current.coherence_issues,
        artifact_updates: current.artifact_updates,
        positive_outcomes: current.positive_outcomes,
        negative_outcomes: current.negative_outcomes,
        neutral_outcomes: current.neutral_outcomes,
        insights,
        suggested_adjustments,
    }
}

fn ratio(n: u64, d: u64) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trust_entry(tick: u64, agent: &str, outcome: &str, delta: i32) -> AuditLogEntry {
        AuditLogEntry::new(
            "trust",
            agent,
            "trust_outcome",
            None,
            tick,
            json!({
                "outcome": outcome,
                "effective_delta": delta,
                "workstream": "ws-a",
                "artifact_kind": "code",
                "tool_category": "edit",
                "affected_artifact_id": null,
            }),
        )
    }

    fn coherence_entry(tick: u64) -> AuditLogEntry {
        AuditLogEntry::new(
            "coherence",
            "issue-1",
            "issue_emitted",
            None,
            tick,
            json!({
                "category": "contradiction",
                "severity": "high",
                "affected_workstreams": ["ws-a"],
                "affected_artifact_ids": ["art-1"],
            }),
        )
    }

    #[test]
    fn high_override_rate_surfaces_an_insight_and_an_adjustment() {
        let entries = vec![
            trust_entry(1, "agent-1", "human_overrides_agent_decision", -3),
            trust_entry(2, "agent-1", "human_approves_tool_call", 1),
        ];
        let window = TickWindow { start_tick: 0, end_tick: 10 };

        let report = retrospective(&entries, window, false);
        assert_eq!(report.decisions, 2);
        assert_eq!(report.overrides, 1);
        assert!(report.insights.iter().any(|i| i.contains("override rate")));
        assert!(!report.suggested_adjustments.is_empty());
    }

    #[test]
    fn coherence_trend_compares_against_preceding_window() {
        let entries = vec![coherence_entry(5), coherence_entry(12), coherence_entry(13)];
        let window = TickWindow { start_tick: 10, end_tick: 20 };

        let report = retrospective(&entries, window, true);
        assert_eq!(report.coherence_issues, 2);
        assert!(report.insights.iter().any(|i| i.contains("increased")));
    }

    #[test]
    fn negative_trust_majority_is_flagged() {
        let entries = vec![
            trust_entry(1, "agent-1", "human_rejects_tool_call", -2),
            trust_entry(2, "agent-1", "error_event", -2),
            trust_entry(3, "agent-1", "human_approves_tool_call", 1),
        ];
        let window = TickWindow { start_tick: 0, end_tick: 10 };

        let report = retrospective(&entries, window, false);
        assert!(report.negative_outcomes > report.positive_outcomes + report.neutral_outcomes);
        assert!(report
            .suggested_adjustments
            .iter()
            .any(|a| a.contains("control mode")));
    }

    #[test]
    fn empty_window_yields_no_insights() {
        let report = retrospective(&[], TickWindow { start_tick: 0, end_tick: 10 }, false);
        assert!(report.insights.is_empty());
        assert!(report.suggested_adjustments.is_empty());
    }
}
