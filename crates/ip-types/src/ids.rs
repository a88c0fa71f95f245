//! Monotonic identifiers.
//!
//! Candidate and issue ids must be strictly increasing within a single
//! coherence monitor instance (spec §3 invariants). These newtypes are
//! constructed only by the owning engine's counter, never ad hoc.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! monotonic_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn first() -> Self {
                Self(1)
            }

            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

monotonic_id!(CandidateId, "candidate");
monotonic_id!(IssueId, "coherence");
monotonic_id!(DecisionId, "decision");

/// A monotonic id counter. Starts such that the first id minted is 1.
#[derive(Debug, Default)]
pub struct IdCounter(u64);

impl IdCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next_candidate(&mut self) -> CandidateId {
        self.0 += 1;
        CandidateId(self.0)
    }
}

#[derive(Debug, Default)]
pub struct IssueCounter(u64);

impl IssueCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(&mut self) -> IssueId {
        self.0 += 1;
        IssueId(self.0)
    }
}
