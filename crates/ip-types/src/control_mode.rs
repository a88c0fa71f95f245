//! Control mode: how much autonomy agents currently operate under (spec
//! §4.7, §4.6 control-mode ROI, §6.4 WebSocket snapshot).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Orchestrator,
    Adaptive,
    Ecosystem,
}
