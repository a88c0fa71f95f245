//! Confidence tiering shared by the control-mode ROI and constraint
//! inference analyzers (spec §4.6): high at 5+ supporting observations,
//! medium at 3+, low otherwise.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

pub fn confidence_for_count(count: u64) -> Confidence {
    if count >= 5 {
        Confidence::High
    } else if count >= 3 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
