//! Match lifecycle state and per-side responses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle state of a match proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    #[default]
    Proposed,
    Accepted,
    Rejected,
    Expired,
    SessionCreated,
    /// Both accepted but no session could be set up.
    Failed,
}

impl MatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::Proposed => "proposed",
            MatchState::Accepted => "accepted",
            MatchState::Rejected => "rejected",
            MatchState::Expired => "expired",
            MatchState::SessionCreated => "session_created",
            MatchState::Failed => "failed",
        }
    }

    /// Proposed or Accepted; the pair may not be matched again meanwhile.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl StateMachine for MatchState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MatchState::*;
        match self {
            Proposed => vec![Accepted, Rejected, Expired],
            Accepted => vec![SessionCreated, Failed],
            Rejected | Expired | SessionCreated | Failed => vec![],
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a user answers to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

/// A side's recorded outcome. `Timeout` is only ever filled in by expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Accepted,
    Rejected,
    Timeout,
}

impl From<Decision> for Response {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => Response::Accepted,
            Decision::Reject => Response::Rejected,
        }
    }
}

/// Which side(s) turned the proposal down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    BothRejected,
    User1Rejected,
    User2Rejected,
}

impl RejectionReason {
    /// Derives the reason from both final responses.
    ///
    /// Checked in order both, user1, user2. Returns `None` when neither
    /// side rejected.
    pub fn from_responses(user1: Response, user2: Response) -> Option<Self> {
        match (user1, user2) {
            (Response::Rejected, Response::Rejected) => Some(RejectionReason::BothRejected),
            (Response::Rejected, _) => Some(RejectionReason::User1Rejected),
            (_, Response::Rejected) => Some(RejectionReason::User2Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::BothRejected => "both_rejected",
            RejectionReason::User1Rejected => "user1_rejected",
            RejectionReason::User2Rejected => "user2_rejected",
        }
    }

    pub fn user1_rejected(&self) -> bool {
        matches!(
            self,
            RejectionReason::BothRejected | RejectionReason::User1Rejected
        )
    }

    pub fn user2_rejected(&self) -> bool {
        matches!(
            self,
            RejectionReason::BothRejected | RejectionReason::User2Rejected
        )
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposed_resolves_three_ways() {
        use MatchState::*;
        assert!(Proposed.can_transition_to(&Accepted));
        assert!(Proposed.can_transition_to(&Rejected));
        assert!(Proposed.can_transition_to(&Expired));
        assert!(!Proposed.can_transition_to(&SessionCreated));
    }

    #[test]
    fn accepted_is_transient() {
        assert!(!MatchState::Accepted.is_terminal());
        assert!(MatchState::Accepted.is_active());
        assert_eq!(
            MatchState::Accepted.valid_transitions(),
            vec![MatchState::SessionCreated, MatchState::Failed]
        );
    }

    #[test]
    fn terminal_states() {
        assert!(MatchState::Rejected.is_terminal());
        assert!(MatchState::Expired.is_terminal());
        assert!(MatchState::SessionCreated.is_terminal());
        assert!(MatchState::Failed.is_terminal());
        assert!(!MatchState::Proposed.can_transition_to(&MatchState::Failed));
    }

    #[test]
    fn rejection_reason_precedence() {
        use Response::*;
        assert_eq!(
            RejectionReason::from_responses(Rejected, Rejected),
            Some(RejectionReason::BothRejected)
        );
        assert_eq!(
            RejectionReason::from_responses(Rejected, Accepted),
            Some(RejectionReason::User1Rejected)
        );
        assert_eq!(
            RejectionReason::from_responses(Accepted, Rejected),
            Some(RejectionReason::User2Rejected)
        );
        assert_eq!(RejectionReason::from_responses(Accepted, Accepted), None);
    }

    #[test]
    fn states_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&MatchState::SessionCreated).unwrap(),
            "\"session_created\""
        );
        assert_eq!(
            serde_json::to_string(&RejectionReason::User2Rejected).unwrap(),
            "\"user2_rejected\""
        );
    }
}
