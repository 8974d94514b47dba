//! CandidateStatus enum for tracking matchmaking eligibility.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where a candidate currently sits in the matchmaking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    Idle,
    Queued,
    Proposed,
    Matched,
    Cooldown,
}

impl CandidateStatus {
    /// Returns the storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Idle => "idle",
            CandidateStatus::Queued => "queued",
            CandidateStatus::Proposed => "proposed",
            CandidateStatus::Matched => "matched",
            CandidateStatus::Cooldown => "cooldown",
        }
    }

    /// Returns true while the candidate is tied to a match.
    pub fn is_committed(&self) -> bool {
        matches!(self, CandidateStatus::Proposed | CandidateStatus::Matched)
    }
}

impl StateMachine for CandidateStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Valid transitions:
    /// - Idle -> Queued | Cooldown
    /// - Queued -> Idle | Proposed | Cooldown
    /// - Proposed -> Queued (claim undone) | Matched | Idle | Cooldown
    /// - Matched -> Idle | Cooldown
    /// - Cooldown -> Idle | Cooldown (extended)
    fn valid_transitions(&self) -> Vec<Self> {
        use CandidateStatus::*;
        match self {
            Idle => vec![Queued, Cooldown],
            Queued => vec![Idle, Proposed, Cooldown],
            Proposed => vec![Queued, Matched, Idle, Cooldown],
            Matched => vec![Idle, Cooldown],
            Cooldown => vec![Idle, Cooldown],
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
