//! The coherence monitor: structural, embedding, content-hash, and
//! LLM-backed detection of cross-workstream conflicts (spec §4.5).

mod config;
mod feedback;
mod layer0;
mod layer1;
mod layer1c;
mod layer2;
mod monitor;
mod state;

pub use config::{CoherenceConfig, FeedbackLoopConfig};
pub use feedback::ThresholdAdjustment;
pub use monitor::CoherenceMonitor;
