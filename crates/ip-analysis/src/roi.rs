//! Control-mode ROI analyzer (spec §4.6): attributes decisions, overrides,
//! completions, and coherence issues to whichever control mode was active
//! when they occurred, then scores each sufficiently-observed mode.

use crate::confidence::Confidence;
use crate::schema::{coherence_issue, control_mode_change, is_override_outcome, trust_outcome};
use ip_types::{AuditLogEntry, ControlMode};
use serde::{Deserialize, Serialize};

const MIN_DECISIONS_PER_MODE: u64 = 5;
const HIGH_CONFIDENCE_TOTAL: u64 = 50;
const MEDIUM_CONFIDENCE_TOTAL: u64 = 20;

struct ModeInterval {
    mode: ControlMode,
    start_tick: u64,
    end_tick: u64,
}

#[derive(Debug, Clone, Default)]
struct ModeTally {
    decisions: u64,
    overrides: u64,
    completions: u64,
    non_completions: u64,
    coherence_issues: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRoi {
    pub mode: ControlMode,
    pub decisions: u64,
    pub override_rate: f64,
    pub completion_rate: f64,
    pub coherence_issue_rate: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlModeRoiReport {
    pub modes: Vec<ModeRoi>,
    pub recommended_mode: Option<ControlMode>,
    pub confidence: Confidence,
}

fn parse_mode(s: &str) -> Option<ControlMode> {
    match s {
        "orchestrator" => Some(ControlMode::Orchestrator),
        "adaptive" => Some(ControlMode::Adaptive),
        "ecosystem" => Some(ControlMode::Ecosystem),
        _ => None,
    }
}

fn build_intervals(entries: &[AuditLogEntry]) -> Vec<ModeInterval> {
    let mut changes: Vec<(u64, ControlMode)> = entries
        .iter()
        .filter_map(|e| control_mode_change(e).and_then(|d| parse_mode(&d.mode)).map(|m| (e.tick, m)))
        .collect();
    changes.sort_by_key(|(tick, _)| *tick);

    let mut intervals = Vec::with_capacity(changes.len());
    for i in 0..changes.len() {
        let (start, mode) = changes[i];
        let end = changes.get(i + 1).map(|(t, _)| *t).unwrap_or(u64::MAX);
        intervals.push(ModeInterval { mode, start_tick: start, end_tick: end });
    }
    intervals
}

fn mode_at(intervals: &[ModeInterval], tick: u64) -> Option<ControlMode> {
    intervals.iter().find(|i| tick >= i.start_tick && tick < i.end_tick).map(|i| i.mode)
}

fn confidence_for_total(total: u64) -> Confidence {
    if total >= HIGH_CONFIDENCE_TOTAL {
        Confidence::High
    } else if total >= MEDIUM_CONFIDENCE_TOTAL {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn control_mode_roi(entries: &[AuditLogEntry]) -> ControlModeRoiReport {
    let intervals = build_intervals(entries);

    let mut tallies: std::collections::HashMap<ControlMode, ModeTally> = std::collections::HashMap::new();

    for entry in entries {
        let Some(mode) = mode_at(&intervals, entry.tick) else { continue };
        let tally = tallies.entry(mode).or_default();

        if let Some(details) = trust_outcome(entry) {
            tally.decisions += 1;
            if is_override_outcome(&details.outcome) {
                tally.overrides += 1;
            }
            match details.outcome.as_str() {
                "task_completed_clean" | "task_completed_partial" => tally.completions += 1,
                "task_abandoned_or_max_turns" | "error_event" => tally.non_completions += 1,
                _ => {}
            }
        } else if coherence_issue(entry).is_some() {
            tally.coherence_issues += 1;
        }
    }

    let mut modes: Vec<ModeRoi> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.decisions >= MIN_DECISIONS_PER_MODE)
        .map(|(mode, tally)| {
            let override_rate = ratio(tally.overrides, tally.decisions);
            let completion_denominator = tally.completions + tally.non_completions;
            let completion_rate = ratio(tally.completions, completion_denominator);
            let coherence_issue_rate = ratio(tally.coherence_issues, tally.decisions).min(1.0);
            let score =
                0.4 * (1.0 - override_rate) + 0.4 * completion_rate + 0.2 * (1.0 - coherence_issue_rate);
            ModeRoi {
                mode,
                decisions: tally.decisions,
                override_rate,
                completion_rate,
                coherence_issue_rate,
                score,
            }
        })
        .collect();

    modes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let total_decisions: u64 = modes.iter().map(|m| m.decisions).sum();
    let recommended_mode = modes.first().map(|m| m.mode);

    ControlModeRoiReport { modes, recommended_mode, confidence: confidence_for_total(total_decisions) }
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

    fn mode_change(tick: u64, mode: &str) -> AuditLogEntry {
        AuditLogEntry::new("control_mode", mode, "control_mode_change", None, tick, json!({ "mode": mode }))
    }

    fn trust_entry(tick: u64, outcome: &str) -> AuditLogEntry {
        AuditLogEntry::new(
            "trust",
            "agent-1",
            "trust_outcome",
            None,
            tick,
            json!({
                "outcome": outcome,
                "effective_delta": 0,
                "workstream": null,
                "artifact_kind": null,
                "tool_category": null,
                "affected_artifact_id": null,
            }),
        )
    }

    #[test]
    fn modes_below_minimum_decisions_are_excluded() {
        let entries = vec![mode_change(0, "orchestrator"), trust_entry(1, "task_completed_clean")];
        let report = control_mode_roi(&entries);
        assert!(report.modes.is_empty());
        assert_eq!(report.recommended_mode, None);
    }

    #[test]
    fn attributes_decisions_to_the_active_interval_and_scores_them() {
        let mut entries = vec![mode_change(0, "orchestrator")];
        for tick in 1..=5 {
            entries.push(trust_entry(tick, "task_completed_clean"));
        }
        entries.push(mode_change(10, "adaptive"));
        for tick in 11..=15 {
            entries.push(trust_entry(tick, "human_overrides_agent_decision"));
        }

        let report = control_mode_roi(&entries);
        assert_eq!(report.modes.len(), 2);

        let orchestrator = report.modes.iter().find(|m| m.mode == ControlMode::Orchestrator).unwrap();
        assert_eq!(orchestrator.decisions, 5);
        assert_eq!(orchestrator.completion_rate, 1.0);
        assert_eq!(orchestrator.override_rate, 0.0);

        let adaptive = report.modes.iter().find(|m| m.mode == ControlMode::Adaptive).unwrap();
        assert_eq!(adaptive.override_rate, 1.0);

        assert_eq!(report.recommended_mode, Some(ControlMode::Orchestrator));
    }

    #[test]
    fn confidence_scales_with_total_decisions_across_included_modes() {
        let mut entries = vec![mode_change(0, "orchestrator")];
        for tick in 1..=20 {
            entries.push(trust_entry(tick, "task_completed_clean"));
        }
        let report = control_mode_roi(&entries);
        assert_eq!(report.confidence, Confidence::Medium);
    }
}
