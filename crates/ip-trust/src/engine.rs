//! The trust engine: per-agent + per-domain scores, outcome deltas,
//! decay, and a calibration log (spec §4.3).

use crate::config::TrustConfig;
use crate::outcome::OutcomeKind;
use ip_types::{AgentTrustState, ArtifactKind, BlastRadius, CalibrationLogEntry, DomainTrust, TrustSnapshot};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrustError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeContext {
    pub artifact_kinds: Vec<ArtifactKind>,
    pub workstreams: Vec<String>,
    pub tool_category: Option<String>,
    pub blast_radius: Option<BlastRadius>,
}

#[derive(Debug, Clone)]
pub struct AppliedOutcome {
    pub base_delta: i32,
    pub effective_delta: i32,
    pub new_global_score: i32,
    pub calibration_only: bool,
}

fn clamp(value: i32, floor: i32, ceiling: i32) -> i32 {
    value.clamp(floor, ceiling)
}

/// Diminishing returns: positive deltas shrink (floor toward zero) above
/// `high`; negative deltas shrink (ceiling toward zero) below `low`.
/// Never inverts sign.
fn diminish(delta: i32, score: i32, high: i32, low: i32) -> i32 {
    if score > high && delta > 0 {
        delta / 2
    } else if score < low && delta < 0 {
        -((-delta) / 2)
    } else {
        delta
    }
}

fn artifact_kind_key(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Code => "code",
        ArtifactKind::Document => "document",
        ArtifactKind::Design => "design",
        ArtifactKind::Config => "config",
        ArtifactKind::Test => "test",
        ArtifactKind::Other => "other",
    }
}

struct Inner {
    config: TrustConfig,
    agents: HashMap<String, AgentTrustState>,
    calibration_log: Vec<CalibrationLogEntry>,
}

pub struct TrustEngine {
    inner: RwLock<Inner>,
}

impl TrustEngine {
    pub fn new(config: TrustConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                config,
                agents: HashMap::new(),
                calibration_log: Vec::new(),
            }),
        }
    }

    fn ensure_agent<'a>(inner: &'a mut Inner, agent_id: &str, tick: u64) -> &'a mut AgentTrustState {
        inner.agents.entry(agent_id.to_string()).or_insert_with(|| AgentTrustState {
            agent_id: agent_id.to_string(),
            global_score: inner.config.initial_score,
            last_activity_tick: tick,
            decay_accumulator: 0.0,
            idle_ticks: 0,
            domains: HashMap::new(),
        })
    }

    pub fn register_agent(&self, agent_id: &str, tick: u64) {
        let mut inner = self.inner.write();
        Self::ensure_agent(&mut inner, agent_id, tick);
    }

    pub fn global_score(&self, agent_id: &str) -> Result<i32, TrustError> {
        self.inner
            .read()
            .agents
            .get(agent_id)
            .map(|a| a.global_score)
            .ok_or_else(|| TrustError::UnknownAgent(agent_id.to_string()))
    }

    pub fn domain_score(&self, agent_id: &str, kind: ArtifactKind) -> Option<i32> {
        self.inner
            .read()
            .agents
            .get(agent_id)?
            .domains
            .get(artifact_kind_key(kind))
            .map(|d| d.score)
    }

    pub fn snapshot(&self) -> Vec<TrustSnapshot> {
        self.inner
            .read()
            .agents
            .values()
            .map(|a| TrustSnapshot {
                agent_id: a.agent_id.clone(),
                score: a.global_score,
            })
            .collect()
    }

    pub fn calibration_log(&self) -> Vec<CalibrationLogEntry> {
        self.inner.read().calibration_log.clone()
    }

    /// Apply-outcome procedure, spec §4.3 steps 1-6.
    pub fn apply_outcome(
        &self,
        agent_id: &str,
        outcome: OutcomeKind,
        tick: u64,
        context: &OutcomeContext,
    ) -> AppliedOutcome {
        let mut inner = self.inner.write();
        let (high, low, floor, ceiling, risk_weighting_enabled, calibration_mode, decay_target_for_log) = {
            let c = &inner.config;
            (
                c.diminishing_return_high,
                c.diminishing_return_low,
                c.floor,
                c.ceiling,
                c.risk_weighting_enabled,
                c.calibration_mode,
                c.decay_target,
            )
        };
        let base_delta = inner.config.delta_for(outcome);

        // Step 2: risk-weight positive deltas only.
        let risk_adjusted = if risk_weighting_enabled && base_delta > 0 {
            if let Some(radius) = context.blast_radius {
                let weight = TrustConfig::risk_weight(radius);
                ((base_delta as f64) * weight).floor() as i32
            } else {
                base_delta
            }
        } else {
            base_delta
        };

        Self::ensure_agent(&mut inner, agent_id, tick);
        let current_score = inner.agents[agent_id].global_score;

        // Step 3: diminishing returns against the global score.
        let global_effective = diminish(risk_adjusted, current_score, high, low);

        if calibration_mode {
            let would_be = clamp(current_score + global_effective, floor, ceiling);
            inner.calibration_log.push(CalibrationLogEntry {
                agent_id: agent_id.to_string(),
                tick,
                outcome: outcome.to_string(),
                base_delta,
                effective_delta: global_effective,
                would_be_score: would_be,
            });
            let _ = decay_target_for_log;
            return AppliedOutcome {
                base_delta,
                effective_delta: global_effective,
                new_global_score: would_be,
                calibration_only: true,
            };
        }

        // Step 5: mutate global score.
        let agent = inner.agents.get_mut(agent_id).unwrap();
        agent.global_score = clamp(agent.global_score + global_effective, floor, ceiling);
        agent.last_activity_tick = tick;
        agent.decay_accumulator = 0.0;
        agent.idle_ticks = 0;
        let new_global_score = agent.global_score;

        // Step 6: per-domain scores, diminished against each domain's own
        // score using the risk-adjusted (pre-global-diminish) delta.
        let initial_score = inner.config.initial_score;
        let agent = inner.agents.get_mut(agent_id).unwrap();
        for kind in &context.artifact_kinds {
            let key = artifact_kind_key(*kind).to_string();
            let domain = agent.domains.entry(key).or_insert_with(|| DomainTrust {
                score: initial_score,
                decay_accumulator: 0.0,
                last_activity_tick: tick,
            });
            let domain_effective = diminish(risk_adjusted, domain.score, high, low);
            domain.score = clamp(domain.score + domain_effective, floor, ceiling);
            domain.last_activity_tick = tick;
            domain.decay_accumulator = 0.0;
        }

        tracing::info!(
            agent_id,
            outcome = %outcome,
            base_delta,
            effective_delta = global_effective,
            new_global_score,
            tick,
            "trust outcome applied"
        );

        AppliedOutcome {
            base_delta,
            effective_delta: global_effective,
            new_global_score,
            calibration_only: false,
        }
    }

    /// Decay every agent with stale activity toward the decay target
    /// (spec §4.3 decay rule).
    pub fn decay_tick(&self, tick: u64) {
        let mut inner = self.inner.write();
        let (rate, decay_target, decay_ceiling, floor, ceiling, inactivity_threshold) = {
            let c = &inner.config;
            (
                c.decay_rate_per_tick,
                c.decay_target,
                c.decay_ceiling,
                c.floor,
                c.ceiling,
                c.inactivity_threshold_ticks,
            )
        };

        for agent in inner.agents.values_mut() {
            if agent.last_activity_tick >= tick {
                continue;
            }
            let idle = tick - agent.last_activity_tick;
            agent.idle_ticks = idle;
            agent.decay_accumulator += rate;
            while agent.decay_accumulator >= 1.0 {
                agent.decay_accumulator -= 1.0;
                let target = if idle > inactivity_threshold {
                    decay_target.min(decay_ceiling).max(floor)
                } else {
                    decay_target
                };
                if agent.global_score < target {
                    agent.global_score += 1;
                } else if agent.global_score > target {
                    agent.global_score -= 1;
                }
                agent.global_score = clamp(agent.global_score, floor, ceiling);
            }

            for domain in agent.domains.values_mut() {
                if domain.last_activity_tick >= tick {
                    continue;
                }
                domain.decay_accumulator += rate;
                while domain.decay_accumulator >= 1.0 {
                    domain.decay_accumulator -= 1.0;
                    if domain.score < decay_target {
                        domain.score += 1;
                    } else if domain.score > decay_target {
                        domain.score -= 1;
                    }
                    domain.score = clamp(domain.score, floor, ceiling);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ip_types::BlastRadius;

    fn engine() -> TrustEngine {
        TrustEngine::new(TrustConfig::default())
    }

    #[test]
    fn clamp_never_escapes_floor_ceiling() {
        let engine = engine();
        engine.register_agent("a-1", 0);
        for _ in 0..100 {
            engine.apply_outcome(
                "a-1",
                OutcomeKind::TaskCompletedClean,
                0,
                &OutcomeContext::default(),
            );
        }
        assert_eq!(engine.global_score("a-1").unwrap(), 100);

        for _ in 0..100 {
            engine.apply_outcome(
                "a-1",
                OutcomeKind::HumanOverridesAgentDecision,
                0,
                &OutcomeContext::default(),
            );
        }
        let score = engine.global_score("a-1").unwrap();
        assert!(score >= 10 && score <= 100);
    }

    #[test]
    fn diminishing_returns_cap_positive_delta_above_high() {
        let engine = engine();
        engine.register_agent("a-1", 0);
        // drive score above 90
        for _ in 0..30 {
            engine.apply_outcome(
                "a-1",
                OutcomeKind::TaskCompletedClean,
                0,
                &OutcomeContext::default(),
            );
        }
        assert!(engine.global_score("a-1").unwrap() > 90);
        let applied = engine.apply_outcome(
            "a-1",
            OutcomeKind::TaskCompletedClean,
            0,
            &OutcomeContext::default(),
        );
        assert!(applied.effective_delta <= applied.base_delta / 2);
    }

    #[test]
    fn diminishing_returns_caps_negative_delta_below_low() {
        let mut config = TrustConfig::default();
        config.initial_score = 15; // already below diminishing_return_low (20)
        let engine = TrustEngine::new(config);
        engine.register_agent("a-1", 0);
        let applied = engine.apply_outcome(
            "a-1",
            OutcomeKind::HumanOverridesAgentDecision,
            0,
            &OutcomeContext::default(),
        );
        // base -3, ceil(-3/2) toward zero = -1
        assert_eq!(applied.base_delta, -3);
        assert_eq!(applied.effective_delta, -1);
    }

    #[test]
    fn risk_weighting_never_dampens_negative_deltas() {
        let mut config = TrustConfig::default();
        config.risk_weighting_enabled = true;
        let engine = TrustEngine::new(config);
        engine.register_agent("a-1", 0);
        let ctx = OutcomeContext {
            blast_radius: Some(BlastRadius::Trivial),
            ..Default::default()
        };
        let applied = engine.apply_outcome("a-1", OutcomeKind::HumanRejectsToolCall, 0, &ctx);
        assert_eq!(applied.effective_delta, -2); // unweighted
    }

    #[test]
    fn risk_weighting_scales_positive_deltas() {
        let mut config = TrustConfig::default();
        config.risk_weighting_enabled = true;
        let engine = TrustEngine::new(config);
        engine.register_agent("a-1", 0);
        let ctx = OutcomeContext {
            blast_radius: Some(BlastRadius::Trivial), // weight 0.5
            ..Default::default()
        };
        let applied = engine.apply_outcome("a-1", OutcomeKind::HumanApprovesAlways, 0, &ctx);
        // base +3, * 0.5 = 1.5, floor = 1
        assert_eq!(applied.effective_delta, 1);
    }

    #[test]
    fn decay_converges_to_target_without_overshoot() {
        let engine = engine();
        engine.register_agent("a-1", 0);
        engine.apply_outcome(
            "a-1",
            OutcomeKind::TaskCompletedClean,
            0,
            &OutcomeContext::default(),
        );
        assert_eq!(engine.global_score("a-1").unwrap(), 53);

        for tick in 1..=400 {
            engine.decay_tick(tick);
        }
        assert_eq!(engine.global_score("a-1").unwrap(), 50);
    }

    #[test]
    fn calibration_mode_does_not_mutate_state() {
        let mut config = TrustConfig::default();
        config.calibration_mode = true;
        let engine = TrustEngine::new(config);
        engine.register_agent("a-1", 0);
        let before = engine.global_score("a-1").unwrap();
        let applied = engine.apply_outcome(
            "a-1",
            OutcomeKind::TaskCompletedClean,
            0,
            &OutcomeContext::default(),
        );
        assert!(applied.calibration_only);
        assert_eq!(engine.global_score("a-1").unwrap(), before);
        assert_eq!(engine.calibration_log().len(), 1);
    }

    #[test]
    fn per_domain_scores_are_lazily_initialized_and_tracked() {
        let engine = engine();
        engine.register_agent("a-1", 0);
        let ctx = OutcomeContext {
            artifact_kinds: vec![ArtifactKind::Code],
            ..Default::default()
        };
        engine.apply_outcome("a-1", OutcomeKind::TaskCompletedClean, 0, &ctx);
        assert_eq!(engine.domain_score("a-1", ArtifactKind::Code), Some(53));
        assert_eq!(engine.domain_score("a-1", ArtifactKind::Document), None);
    }
}
