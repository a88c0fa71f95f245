//! Layer 1→2 feedback loop: auto-tunes the Layer 1 promotion threshold
//! from a rolling 24-hour window of Layer 2 outcomes (spec §4.5).

use crate::config::FeedbackLoopConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdAdjustment {
    pub old_threshold: f64,
    pub new_threshold: f64,
    pub false_positive_rate: f64,
    pub adjusted_at: DateTime<Utc>,
}

struct Window {
    start: DateTime<Utc>,
    confirmed: u64,
    dismissed: u64,
}

pub struct FeedbackLoop {
    config: FeedbackLoopConfig,
    window: Window,
    history: Vec<ThresholdAdjustment>,
    on_adjust: Option<Box<dyn Fn(&ThresholdAdjustment) + Send + Sync>>,
}

impl FeedbackLoop {
    pub fn new(config: FeedbackLoopConfig) -> Self {
        Self {
            config,
            window: Window { start: Utc::now(), confirmed: 0, dismissed: 0 },
            history: Vec::new(),
            on_adjust: None,
        }
    }

    pub fn with_audit_callback(mut self, callback: Box<dyn Fn(&ThresholdAdjustment) + Send + Sync>) -> Self {
        self.on_adjust = Some(callback);
        self
    }

    pub fn threshold_history(&self) -> &[ThresholdAdjustment] {
        &self.history
    }

    /// Records this batch's confirmed/dismissed tallies and, once enough
    /// reviews have accumulated in the (possibly-rolled) window, adjusts
    /// `current_threshold` in place. Returns the adjustment if one was
    /// made.
    pub fn record_batch(
        &mut self,
        confirmed: u64,
        dismissed: u64,
        current_threshold: &mut f64,
    ) -> Option<ThresholdAdjustment> {
        let now = Utc::now();
        if (now - self.window.start).num_hours() >= self.config.window_hours {
            self.window = Window { start: now, confirmed: 0, dismissed: 0 };
        }
        self.window.confirmed += confirmed;
        self.window.dismissed += dismissed;

        let total = self.window.confirmed + self.window.dismissed;
        if total < self.config.min_reviews_before_adjust {
            return None;
        }

        let fp_rate = self.window.dismissed as f64 / total as f64;
        let old_threshold = *current_threshold;
        let new_threshold = if fp_rate > self.config.fp_threshold_high {
            (old_threshold + self.config.increase_step).min(self.config.max_promotion_threshold)
        } else if fp_rate < self.config.fp_threshold_low {
            (old_threshold - self.config.decrease_step).max(self.config.min_promotion_threshold)
        } else {
            old_threshold
        };

        if (new_threshold - old_threshold).abs() < f64::EPSILON {
            return None;
        }

        *current_threshold = new_threshold;
        let adjustment = ThresholdAdjustment {
            old_threshold,
            new_threshold,
            false_positive_rate: fp_rate,
            adjusted_at: now,
        };
        self.history.push(adjustment.clone());
        if let Some(callback) = &self.on_adjust {
            callback(&adjustment);
        }
        Some(adjustment)
    }
}
