//! Coherence monitor configuration (spec §4.5). All thresholds and
//! intervals tunable; defaults as specified.

#[derive(Debug, Clone)]
pub struct CoherenceConfig {
    pub layer1_scan_interval_ticks: u64,
    pub layer1_promotion_threshold: f64,
    pub layer1_advisory_threshold: f64,
    pub layer1_max_artifacts_per_scan: usize,
    pub layer1c_scan_interval_ticks: u64,
    pub layer1c_max_corpus_tokens: usize,
    pub layer2_max_reviews_per_hour: usize,
    pub skip_layer2_for_embeddings: bool,
    pub enable_layer2: bool,
    pub feedback_loop: Option<FeedbackLoopConfig>,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            layer1_scan_interval_ticks: 10,
            layer1_promotion_threshold: 0.75,
            layer1_advisory_threshold: 0.65,
            layer1_max_artifacts_per_scan: 500,
            layer1c_scan_interval_ticks: 300,
            layer1c_max_corpus_tokens: 200_000,
            layer2_max_reviews_per_hour: 30,
            skip_layer2_for_embeddings: false,
            enable_layer2: true,
            feedback_loop: None,
        }
    }
}

/// Layer 1→2 feedback loop tuning (spec §4.5, auto-tuning).
#[derive(Debug, Clone)]
pub struct FeedbackLoopConfig {
    pub min_reviews_before_adjust: u64,
    pub fp_threshold_high: f64,
    pub fp_threshold_low: f64,
    pub increase_step: f64,
    pub decrease_step: f64,
    pub max_promotion_threshold: f64,
    pub min_promotion_threshold: f64,
    pub window_hours: i64,
}

impl Default for FeedbackLoopConfig {
    fn default() -> Self {
        Self {
            min_reviews_before_adjust: 20,
            fp_threshold_high: 0.50,
            fp_threshold_low: 0.10,
            increase_step: 0.02,
            decrease_step: 0.01,
            max_promotion_threshold: 0.95,
            min_promotion_threshold: 0.75,
            window_hours: 24,
        }
    }
}
