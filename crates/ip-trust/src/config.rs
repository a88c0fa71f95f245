//! Trust engine configuration (spec §4.3). All values tunable; defaults
//! as specified.

use crate::outcome::{default_deltas, OutcomeKind};
use ip_types::BlastRadius;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TrustConfig {
    pub initial_score: i32,
    pub floor: i32,
    pub ceiling: i32,
    pub decay_target: i32,
    pub decay_rate_per_tick: f64,
    pub diminishing_return_high: i32,
    pub diminishing_return_low: i32,
    pub decay_ceiling: i32,
    pub inactivity_threshold_ticks: u64,
    pub risk_weighting_enabled: bool,
    pub deltas: HashMap<OutcomeKind, i32>,
    pub calibration_mode: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            initial_score: 50,
            floor: 10,
            ceiling: 100,
            decay_target: 50,
            decay_rate_per_tick: 0.01,
            diminishing_return_high: 90,
            diminishing_return_low: 20,
            decay_ceiling: 50,
            inactivity_threshold_ticks: 0,
            risk_weighting_enabled: false,
            deltas: default_deltas(),
            calibration_mode: false,
        }
    }
}

impl TrustConfig {
    pub fn delta_for(&self, outcome: OutcomeKind) -> i32 {
        self.deltas.get(&outcome).copied().unwrap_or(0)
    }

    /// Blast-radius risk weight (spec §4.3 step 2). Only applied to
    /// positive deltas; negative deltas always pass through unweighted.
    pub fn risk_weight(radius: BlastRadius) -> f64 {
        match radius {
            BlastRadius::Trivial => 0.5,
            BlastRadius::Small => 0.75,
            BlastRadius::Medium => 1.0,
            BlastRadius::Large => 1.5,
            BlastRadius::Unknown => 1.0,
        }
    }
}
