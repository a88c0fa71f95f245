//! Constraint inference (spec §4.6): surfaces data-driven constraint
//! suggestions once a workstream or tool accumulates enough overrides, or
//! a workstream pair accumulates enough coherence issues, to look like a
//! pattern rather than noise.

use crate::confidence::{confidence_for_count, Confidence};
use crate::schema::{coherence_issue, is_override_outcome, trust_outcome};
use ip_types::AuditLogEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const WORKSTREAM_OVERRIDE_THRESHOLD: u64 = 3;
const TOOL_OVERRIDE_THRESHOLD: u64 = 3;
const PAIR_COHERENCE_THRESHOLD: u64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintKind {
    WorkstreamOverrides { workstream: String },
    ToolOverrides { tool_category: String },
    WorkstreamPairCoherence { workstream_a: String, workstream_b: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSuggestion {
    pub kind: ConstraintKind,
    pub count: u64,
    pub confidence: Confidence,
}

pub fn infer_constraints(entries: &[AuditLogEntry]) -> Vec<ConstraintSuggestion> {
    let mut workstream_overrides: HashMap<String, u64> = HashMap::new();
    let mut tool_overrides: HashMap<String, u64> = HashMap::new();
    let mut pair_coherence: HashMap<(String, String), u64> = HashMap::new();

    for entry in entries {
        if let Some(details) = trust_outcome(entry) {
            if is_override_outcome(&details.outcome) {
                if let Some(workstream) = &details.workstream {
                    *workstream_overrides.entry(workstream.clone()).or_insert(0) += 1;
                }
                if let Some(tool) = &details.tool_category {
                    *tool_overrides.entry(tool.clone()).or_insert(0) += 1;
                }
            }
        } else if let Some(details) = coherence_issue(entry) {
            let mut workstreams: Vec<String> = details.affected_workstreams.into_iter().collect();
            workstreams.sort();
            workstreams.dedup();
            if workstreams.len() == 2 {
                let key = (workstreams[0].clone(), workstreams[1].clone());
                *pair_coherence.entry(key).or_insert(0) += 1;
            }
        }
    }

    let mut suggestions = Vec::new();

    for (workstream, count) in workstream_overrides {
        if count >= WORKSTREAM_OVERRIDE_THRESHOLD {
            suggestions.push(ConstraintSuggestion {
                kind: ConstraintKind::WorkstreamOverrides { workstream },
                count,
                confidence: confidence_for_count(count),
            });
        }
    }

    for (tool_category, count) in tool_overrides {
        if count >= TOOL_OVERRIDE_THRESHOLD {
            suggestions.push(ConstraintSuggestion {
                kind: ConstraintKind::ToolOverrides { tool_category },
                count,
                confidence: confidence_for_count(count),
            });
        }
    }

    for ((workstream_a, workstream_b), count) in pair_coherence {
        if count >= PAIR_COHERENCE_THRESHOLD {
            suggestions.push(ConstraintSuggestion {
                kind: ConstraintKind::WorkstreamPairCoherence { workstream_a, workstream_b },
                count,
                confidence: confidence_for_count(count),
            });
        }
    }

    suggestions.sort_by(|a, b| b.count.cmp(&a.count));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn override_entry(workstream: &str, tool: &str) -> AuditLogEntry {
        AuditLogEntry::new(
            "trust",
            "agent-1",
            "trust_outcome",
            None,
            1,
            json!({
                "outcome": "human_overrides_agent_decision",
                "effective_delta": -3,
                "workstream": workstream,
                "artifact_kind": null,
                "tool_category": tool,
                "affected_artifact_id": null,
            }),
        )
    }

    fn coherence_entry(workstreams: &[&str]) -> AuditLogEntry {
        AuditLogEntry::new(
            "coherence",
            "issue-1",
            "issue_emitted",
            None,
            1,
            json!({
                "category": "duplication",
                "severity": "high",
                "affected_workstreams": workstreams,
                "affected_artifact_ids": ["art-1", "art-2"],
            }),
        )
    }

    #[test]
    fn workstream_reaching_threshold_surfaces_with_low_confidence() {
        let entries = vec![
            override_entry("ws-a", "edit"),
            override_entry("ws-a", "edit"),
            override_entry("ws-a", "edit"),
        ];
        let suggestions = infer_constraints(&entries);
        let workstream_suggestion = suggestions
            .iter()
            .find(|s| matches!(&s.kind, ConstraintKind::WorkstreamOverrides { workstream } if workstream == "ws-a"))
            .unwrap();
        assert_eq!(workstream_suggestion.count, 3);
        assert_eq!(workstream_suggestion.confidence, Confidence::Medium);
    }

    #[test]
    fn workstream_pair_needs_only_two_coherence_issues() {
        let entries = vec![coherence_entry(&["ws-a", "ws-b"]), coherence_entry(&["ws-b", "ws-a"])];
        let suggestions = infer_constraints(&entries);
        let pair_suggestion = suggestions
            .iter()
            .find(|s| matches!(&s.kind, ConstraintKind::WorkstreamPairCoherence { .. }))
            .unwrap();
        assert_eq!(pair_suggestion.count, 2);
        assert_eq!(pair_suggestion.confidence, Confidence::Low);
    }

    #[test]
    fn below_threshold_produces_no_suggestion() {
        let entries = vec![override_entry("ws-a", "edit"), override_entry("ws-a", "edit")];
        let suggestions = infer_constraints(&entries);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn five_overrides_reach_high_confidence() {
        let entries = (0..5).map(|_| override_entry("ws-a", "edit")).collect::<Vec<_>>();
        let suggestions = infer_constraints(&entries);
        assert_eq!(suggestions[0].confidence, Confidence::High);
    }
}
