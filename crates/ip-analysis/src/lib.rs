//! Audit-log analyzers (spec §4.6): five read-only, synchronous passes
//! over the append-only audit log, each surfacing a different shape of
//! "what has been happening" for a human operator. None of them hold
//! state — every call takes the full (or windowed) log and recomputes
//! from scratch, mirroring how `ip-store`'s in-memory log is the only
//! durable record (spec §9's persistence model).

pub mod confidence;
pub mod constraint;
pub mod override_pattern;
pub mod retrospective;
pub mod rework;
pub mod roi;
pub mod schema;

pub use confidence::Confidence;
pub use constraint::{infer_constraints, ConstraintKind, ConstraintSuggestion};
pub use override_pattern::{analyze_override_patterns, OverrideGroup, OverrideGroupKey, OverridePatternReport, TemporalBurst};
pub use retrospective::{retrospective, RetrospectiveReport, TickWindow};
pub use rework::{link_rework, ReworkLink, ReworkRates, Trigger};
pub use roi::{control_mode_roi, ControlModeRoiReport, ModeRoi};
