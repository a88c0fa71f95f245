//! Context injection scheduling (spec §4.7). A policy layer only: the
//! interval table and the bookkeeping needed for later efficiency
//! analysis (which included artifacts were later referenced). Building
//! and sending the actual context message is a collaborator concern.

use ip_types::ControlMode;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct ContextInjectionConfig {
    pub orchestrator_interval_ticks: u64,
    pub adaptive_interval_ticks: u64,
    pub ecosystem_interval_ticks: u64,
}

impl Default for ContextInjectionConfig {
    fn default() -> Self {
        Self {
            orchestrator_interval_ticks: 10,
            adaptive_interval_ticks: 20,
            ecosystem_interval_ticks: 50,
        }
    }
}

impl ContextInjectionConfig {
    pub fn interval_for(&self, mode: ControlMode) -> u64 {
        match mode {
            ControlMode::Orchestrator => self.orchestrator_interval_ticks,
            ControlMode::Adaptive => self.adaptive_interval_ticks,
            ControlMode::Ecosystem => self.ecosystem_interval_ticks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContextInjectionRecord {
    pub agent_id: String,
    pub tick: u64,
    pub included_artifact_ids: Vec<String>,
    pub referenced_artifact_ids: Vec<String>,
}

/// Index into `ContextInjectionTracker::history`. Returned by
/// `record_injection` so a caller can later attribute references back to
/// the injection that introduced them.
pub type InjectionId = usize;

pub struct ContextInjectionTracker {
    config: ContextInjectionConfig,
    inner: Mutex<Inner>,
}

struct Inner {
    last_injection_tick: HashMap<String, u64>,
    history: Vec<ContextInjectionRecord>,
}

impl ContextInjectionTracker {
    pub fn new(config: ContextInjectionConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner { last_injection_tick: HashMap::new(), history: Vec::new() }),
        }
    }

    /// True when `agent_id` is due for a context injection under `mode`
    /// at `current_tick` — never injected before, or the mode's interval
    /// has elapsed since the last one.
    pub fn should_inject(&self, agent_id: &str, mode: ControlMode, current_tick: u64) -> bool {
        let interval = self.config.interval_for(mode);
        match self.inner.lock().last_injection_tick.get(agent_id) {
            None => true,
            Some(last) => current_tick.saturating_sub(*last) >= interval,
        }
    }

    /// Records an injection, returning an id for later reference
    /// attribution.
    pub fn record_injection(
        &self,
        agent_id: &str,
        tick: u64,
        included_artifact_ids: Vec<String>,
    ) -> InjectionId {
        let mut inner = self.inner.lock();
        inner.last_injection_tick.insert(agent_id.to_string(), tick);
        inner.history.push(ContextInjectionRecord {
            agent_id: agent_id.to_string(),
            tick,
            included_artifact_ids,
            referenced_artifact_ids: Vec::new(),
        });
        inner.history.len() - 1
    }

    /// Records that `artifact_id` was referenced by the agent after
    /// injection `id`, for later efficiency analysis.
    pub fn record_reference(&self, id: InjectionId, artifact_id: &str) {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.history.get_mut(id) {
            record.referenced_artifact_ids.push(artifact_id.to_string());
        }
    }

    pub fn history(&self) -> Vec<ContextInjectionRecord> {
        self.inner.lock().history.clone()
    }

    /// Fraction of an injection's included artifacts that were
    /// subsequently referenced; `None` if the injection id is unknown.
    pub fn efficiency_for(&self, id: InjectionId) -> Option<f64> {
        let inner = self.inner.lock();
        let record = inner.history.get(id)?;
        if record.included_artifact_ids.is_empty() {
            return Some(0.0);
        }
        let referenced: HashSet<&String> = record.referenced_artifact_ids.iter().collect();
        let hits = record.included_artifact_ids.iter().filter(|id| referenced.contains(id)).count();
        Some(hits as f64 / record.included_artifact_ids.len() as f64)
    }
}
