//! Shared data model for the Intelligence Plane.
//!
//! Hosts the types every pillar crate (tick, bus, trust, decisions,
//! coherence, analysis) depends on, the way `agentkern-governance` grounds
//! the other AgentKern pillars.

pub mod artifact;
pub mod audit;
pub mod coherence;
pub mod control_mode;
pub mod decision;
pub mod ids;
pub mod trust;

pub use artifact::{ArtifactEvent, ArtifactKind, ArtifactStatus, Provenance};
pub use audit::AuditLogEntry;
pub use control_mode::ControlMode;
pub use coherence::{CanonicalPairKey, CandidateSource, CoherenceCandidate, CoherenceCategory, CoherenceEvent};
pub use decision::{
    AutoResolvePolicy, BlastRadius, DecisionEvent, DecisionOption, DecisionPayload,
    DecisionStatus, HumanResolution, OptionDecision, QueuedDecision, ResolutionRecord, Severity,
    ToolApprovalDecision,
};
pub use ids::{CandidateId, DecisionId, IdCounter, IssueCounter, IssueId};
pub use trust::{AgentTrustState, CalibrationLogEntry, DomainTrust, TrustSnapshot};
