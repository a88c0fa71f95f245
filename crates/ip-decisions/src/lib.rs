//! The decision queue: a FIFO of pending human decisions, enforcing
//! timeouts and policy-based auto-resolution (spec §4.4).

use ip_types::{
    DecisionEvent, DecisionPayload, DecisionStatus, HumanResolution, QueuedDecision,
    ResolutionRecord, Severity,
};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("decision {0} is not pending")]
    NotPending(String),
    #[error("decision {0} already enqueued")]
    Duplicate(String),
    #[error("decision {0} not found")]
    NotFound(String),
}

struct Inner {
    decisions: HashMap<String, QueuedDecision>,
    /// Enqueue order, used as the stable tiebreak within a (tick,
    /// severity) tier (spec §3: "preserves enqueue order for decisions at
    /// the same priority tier").
    order: Vec<String>,
}

pub struct DecisionQueue {
    inner: RwLock<Inner>,
}

impl Default for DecisionQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn severity_rank(s: Severity) -> u8 {
    match s {
        Severity::Critical => 3,
        Severity::High => 2,
        Severity::Medium => 1,
        Severity::Low => 0,
    }
}

impl DecisionQueue {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                decisions: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    pub fn enqueue(
        &self,
        event: DecisionEvent,
        current_tick: u64,
    ) -> Result<QueuedDecision, QueueError> {
        let mut inner = self.inner.write();
        if inner.decisions.contains_key(&event.decision_id) {
            return Err(QueueError::Duplicate(event.decision_id.clone()));
        }
        let deadline_tick = event.due_by_tick;
        let id = event.decision_id.clone();
        let queued = QueuedDecision {
            event,
            status: DecisionStatus::Pending,
            enqueued_tick: current_tick,
            deadline_tick,
            resolution: None,
        };
        inner.decisions.insert(id.clone(), queued.clone());
        inner.order.push(id);
        tracing::info!(decision_id = %queued.event.decision_id, "decision enqueued");
        Ok(queued)
    }

    pub fn resolve(
        &self,
        decision_id: &str,
        resolution: HumanResolution,
        current_tick: u64,
    ) -> Result<QueuedDecision, QueueError> {
        let mut inner = self.inner.write();
        let decision = inner
            .decisions
            .get_mut(decision_id)
            .ok_or_else(|| QueueError::NotFound(decision_id.to_string()))?;
        if !decision.is_pending() {
            return Err(QueueError::NotPending(decision_id.to_string()));
        }
        decision.status = DecisionStatus::Resolved;
        decision.resolution = Some(ResolutionRecord {
            resolution,
            resolved_at_tick: current_tick,
        });
        tracing::info!(decision_id, "decision resolved");
        Ok(decision.clone())
    }

    pub fn get(&self, decision_id: &str) -> Option<QueuedDecision> {
        self.inner.read().decisions.get(decision_id).cloned()
    }

    fn sorted_pending(inner: &Inner) -> Vec<QueuedDecision> {
        let mut pending: Vec<QueuedDecision> = inner
            .order
            .iter()
            .filter_map(|id| inner.decisions.get(id))
            .filter(|d| d.is_pending())
            .cloned()
            .collect();
        // Stable sort: enqueue tick ascending, then severity descending;
        // ties preserve original (enqueue) order.
        pending.sort_by_key(|d| (d.enqueued_tick, Reverse(severity_rank(d.event.severity))));
        pending
    }

    pub fn list_pending(&self) -> Vec<QueuedDecision> {
        Self::sorted_pending(&self.inner.read())
    }

    pub fn list_pending_for(&self, workstream: &str) -> Vec<QueuedDecision> {
        Self::sorted_pending(&self.inner.read())
            .into_iter()
            .filter(|d| d.event.workstream == workstream)
            .collect()
    }

    /// Per-tick expiry pass (spec §4.4). Returns decisions that newly
    /// timed out or auto-resolved this tick; both outcomes are mapped by
    /// the caller to a `task_abandoned_or_max_turns` trust outcome.
    pub fn tick(&self, current_tick: u64) -> Vec<QueuedDecision> {
        let mut inner = self.inner.write();
        let expired_ids: Vec<String> = inner
            .order
            .iter()
            .filter(|id| {
                inner
                    .decisions
                    .get(*id)
                    .map(|d| {
                        d.is_pending()
                            && d.deadline_tick
                                .is_some_and(|deadline| current_tick >= deadline)
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let mut expired = Vec::with_capacity(expired_ids.len());
        for id in expired_ids {
            let decision = inner.decisions.get_mut(&id).unwrap();
            let auto_resolve = match &decision.event.payload {
                DecisionPayload::Option(opt) => opt.auto_resolve.clone(),
                DecisionPayload::ToolApproval(_) => None,
            };
            match auto_resolve {
                Some(policy) => {
                    decision.status = DecisionStatus::AutoResolved;
                    decision.resolution = Some(ResolutionRecord {
                        resolution: HumanResolution::OptionChosen {
                            option_id: policy.action_label,
                        },
                        resolved_at_tick: current_tick,
                    });
                    tracing::info!(decision_id = %id, "decision auto-resolved on timeout");
                }
                None => {
                    decision.status = DecisionStatus::TimedOut;
                    tracing::info!(decision_id = %id, "decision timed out");
                }
            }
            expired.push(decision.clone());
        }
        expired
    }
}
