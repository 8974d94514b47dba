//! Match domain events.
//!
//! - `MatchProposed` - A pairing was claimed and proposed to both users
//! - `MatchResolved` - Both users answered (accepted or rejected)
//! - `MatchExpired` - The answer window closed before both answered
//! - `MatchFailed` - Both accepted but the session was never set up

use serde::{Deserialize, Serialize};

use super::{Match, MatchState, RejectionReason, Response};
use crate::domain::foundation::{domain_event, EventId, MatchId, SessionId, Timestamp, UserId};
use crate::domain::scoring::LanguagePair;

// ════════════════════════════════════════════════════════════════════════════
// MatchProposed
// ════════════════════════════════════════════════════════════════════════════

/// Published when two candidates are proposed to each other.
///
/// Notification collaborators use this to prompt both users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProposed {
    pub event_id: EventId,
    pub match_id: MatchId,
    pub user1: UserId,
    pub user2: UserId,
    pub languages: LanguagePair,
    pub score: f64,
    pub expires_at: Timestamp,
    pub proposed_at: Timestamp,
}

domain_event!(
    MatchProposed,
    event_type = "match.proposed.v1",
    schema_version = 1,
    aggregate_id = match_id,
    aggregate_type = "Match",
    occurred_at = proposed_at,
    event_id = event_id
);

impl MatchProposed {
    pub fn from_match(m: &Match) -> Self {
        Self {
            event_id: EventId::new(),
            match_id: m.id(),
            user1: m.user1().clone(),
            user2: m.user2().clone(),
            languages: m.languages().clone(),
            score: m.score(),
            expires_at: m.expires_at(),
            proposed_at: m.proposed_at(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MatchResolved
// ════════════════════════════════════════════════════════════════════════════

/// Published when both users have answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResolved {
    pub event_id: EventId,
    pub match_id: MatchId,
    pub state: MatchState,
    pub rejection_reason: Option<RejectionReason>,
    pub session_id: Option<SessionId>,
    pub resolved_at: Timestamp,
}

domain_event!(
    MatchResolved,
    event_type = "match.resolved.v1",
    schema_version = 1,
    aggregate_id = match_id,
    aggregate_type = "Match",
    occurred_at = resolved_at,
    event_id = event_id
);

impl MatchResolved {
    pub fn from_match(m: &Match, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            match_id: m.id(),
            state: m.state(),
            rejection_reason: m.rejection_reason(),
            session_id: m.session_id(),
            resolved_at: now,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MatchExpired
// ════════════════════════════════════════════════════════════════════════════

/// Published when a proposal times out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchExpired {
    pub event_id: EventId,
    pub match_id: MatchId,
    pub user1_response: Option<Response>,
    pub user2_response: Option<Response>,
    pub expired_at: Timestamp,
}

domain_event!(
    MatchExpired,
    event_type = "match.expired.v1",
    schema_version = 1,
    aggregate_id = match_id,
    aggregate_type = "Match",
    occurred_at = expired_at,
    event_id = event_id
);

impl MatchExpired {
    pub fn from_match(m: &Match, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            match_id: m.id(),
            user1_response: m.user1_response().map(|r| r.response),
            user2_response: m.user2_response().map(|r| r.response),
            expired_at: now,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MatchFailed
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFailed {
    pub event_id: EventId,
    pub match_id: MatchId,
    pub user1: UserId,
    pub user2: UserId,
    pub failure_reason: String,
    pub failed_at: Timestamp,
}

domain_event!(
    MatchFailed,
    event_type = "match.failed.v1",
    schema_version = 1,
    aggregate_id = match_id,
    aggregate_type = "Match",
    occurred_at = failed_at,
    event_id = event_id
);

impl MatchFailed {
    pub fn from_match(m: &Match, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            match_id: m.id(),
            user1: m.user1().clone(),
            user2: m.user2().clone(),
            failure_reason: m.failure_reason().unwrap_or_default().to_string(),
            failed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::fixtures::at;
    use crate::domain::foundation::SerializableDomainEvent;
    use crate::domain::proposal::aggregate::fixtures::{accepted, proposed};

    #[test]
    fn match_proposed_carries_deadline() {
        let m = proposed();
        let envelope = MatchProposed::from_match(&m).to_envelope();
        assert_eq!(envelope.event_type, "match.proposed.v1");
        assert_eq!(envelope.aggregate_id, m.id().to_string());
        assert_eq!(envelope.occurred_at, at(0));
        assert!(envelope.payload["expires_at"].is_string());
    }

    #[test]
    fn match_expired_reports_timeouts() {
        let mut m = proposed();
        m.expire(at(91)).unwrap();
        let event = MatchExpired::from_match(&m, at(91));
        assert_eq!(event.user1_response, Some(Response::Timeout));
        assert_eq!(event.to_envelope().payload["user2_response"], "timeout");
    }

    #[test]
    fn match_failed_carries_reason() {
        let mut m = accepted();
        m.fail("session_setup_failed", at(200)).unwrap();
        let envelope = MatchFailed::from_match(&m, at(200)).to_envelope();
        assert_eq!(envelope.event_type, "match.failed.v1");
        assert_eq!(envelope.payload["failure_reason"], "session_setup_failed");
    }
}
