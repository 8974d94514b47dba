//! Match aggregate entity.
//!
//! A match is a proposal that two queued candidates talk to each other.
//! Both must accept within the proposal TTL before a session is created.
//!
//! # Ownership
//!
//! A match references its users and, once created, its session by ID. It
//! does not own either; the application layer keeps candidates and the
//! session consistent with the match outcome.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{Decision, MatchState, RejectionReason, Response};
use crate::domain::foundation::{
    DomainError, ErrorCode, MatchId, SessionId, StateMachine, Timestamp, UserId, Version,
};
use crate::domain::matchmaking::ProposedPairing;
use crate::domain::scoring::{LanguagePair, MatchingFactors};

/// Default time to answer a proposal.
pub const DEFAULT_PROPOSAL_TTL_SECS: i64 = 90;

/// Failure reason for an accepted match whose session never came up.
pub const SESSION_SETUP_FAILED: &str = "session_setup_failed";

/// Which side of the match a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    User1,
    User2,
}

/// One side's recorded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideResponse {
    pub response: Response,
    pub responded_at: Timestamp,
}

/// Match aggregate - a pairing awaiting, or resolved by, mutual acceptance.
///
/// # Invariants
///
/// - `user1 != user2`
/// - `expires_at = proposed_at + TTL`
/// - `Accepted` implies both responses are `Accepted`
/// - `Rejected` implies both sides responded and `rejection_reason` is set
/// - `SessionCreated` implies `session_id` is set
/// - `Failed` implies `failure_reason` is set
/// - a recorded response is never overwritten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    id: MatchId,
    user1: UserId,
    user2: UserId,
    languages: LanguagePair,
    score: f64,
    factors: MatchingFactors,

    state: MatchState,
    user1_response: Option<SideResponse>,
    user2_response: Option<SideResponse>,

    proposed_at: Timestamp,
    expires_at: Timestamp,
    accepted_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    rejection_reason: Option<RejectionReason>,
    #[serde(default)]
    failure_reason: Option<String>,
    session_id: Option<SessionId>,

    version: Version,
}

impl Match {
    /// Proposes a planned pairing.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if both sides are the same user or the TTL is
    ///   not positive
    pub fn propose(
        id: MatchId,
        pairing: ProposedPairing,
        ttl: Duration,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        if pairing.user1 == pairing.user2 {
            return Err(DomainError::validation(
                "user2",
                "A user cannot be matched with themselves",
            ));
        }
        if ttl <= Duration::zero() {
            return Err(DomainError::validation(
                "proposal_ttl",
                "Proposal TTL must be positive",
            ));
        }

        Ok(Self {
            id,
            user1: pairing.user1,
            user2: pairing.user2,
            languages: pairing.languages,
            score: pairing.score,
            factors: pairing.factors,
            state: MatchState::Proposed,
            user1_response: None,
            user2_response: None,
            proposed_at: now,
            expires_at: now.plus(ttl),
            accepted_at: None,
            completed_at: None,
            rejection_reason: None,
            failure_reason: None,
            session_id: None,
            version: Version::initial(),
        })
    }

    /// Returns a copy carrying the given stored version. Used by adapters.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn user1(&self) -> &UserId {
        &self.user1
    }

    pub fn user2(&self) -> &UserId {
        &self.user2
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn factors(&self) -> &MatchingFactors {
        &self.factors
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn user1_response(&self) -> Option<SideResponse> {
        self.user1_response
    }

    pub fn user2_response(&self) -> Option<SideResponse> {
        self.user2_response
    }

    pub fn proposed_at(&self) -> Timestamp {
        self.proposed_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn accepted_at(&self) -> Option<Timestamp> {
        self.accepted_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        self.rejection_reason
    }

    /// Why an accepted match never got its session.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_participant(&self, user: &UserId) -> bool {
        self.side_of(user).is_some()
    }

    pub fn side_of(&self, user: &UserId) -> Option<Side> {
        if user == &self.user1 {
            Some(Side::User1)
        } else if user == &self.user2 {
            Some(Side::User2)
        } else {
            None
        }
    }

    /// True if this match is between the two users, in either order.
    pub fn involves_pair(&self, a: &UserId, b: &UserId) -> bool {
        (&self.user1 == a && &self.user2 == b) || (&self.user1 == b && &self.user2 == a)
    }

    /// The other participant.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this match
    pub fn partner_of(&self, user: &UserId) -> Result<&UserId, DomainError> {
        match self.side_of(user) {
            Some(Side::User1) => Ok(&self.user2),
            Some(Side::User2) => Ok(&self.user1),
            None => Err(self.not_participant(user)),
        }
    }

    /// The user's recorded response, if any.
    pub fn response_of(&self, user: &UserId) -> Option<Response> {
        match self.side_of(user)? {
            Side::User1 => self.user1_response.map(|r| r.response),
            Side::User2 => self.user2_response.map(|r| r.response),
        }
    }

    /// True once the answer window has closed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.is_after(&self.expires_at)
    }

    /// True while answers are still accepted.
    pub fn is_pending(&self, now: Timestamp) -> bool {
        self.state == MatchState::Proposed && !self.is_expired(now)
    }

    pub fn is_fully_responded(&self) -> bool {
        self.user1_response.is_some() && self.user2_response.is_some()
    }

    pub fn is_accepted_by_both(&self) -> bool {
        matches!(
            (self.user1_response, self.user2_response),
            (Some(a), Some(b)) if a.response == Response::Accepted && b.response == Response::Accepted
        )
    }

    /// Seconds from proposal to the last real (non-timeout) response.
    pub fn response_latency(&self) -> Option<i64> {
        [self.user1_response, self.user2_response]
            .into_iter()
            .flatten()
            .filter(|r| r.response != Response::Timeout)
            .map(|r| r.responded_at)
            .max()
            .map(|last| last.seconds_since(&self.proposed_at))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Records one participant's answer and resolves the match once both
    /// have answered. Returns the resulting state.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this match
    /// - `InvalidStateTransition` if the match is no longer Proposed
    /// - `AlreadyResponded` if this user already answered
    /// - `ProposalExpired` if the answer window has closed
    pub fn record_response(
        &mut self,
        user: &UserId,
        decision: Decision,
        now: Timestamp,
    ) -> Result<MatchState, DomainError> {
        let side = self.side_of(user).ok_or_else(|| self.not_participant(user))?;

        if self.state != MatchState::Proposed {
            return Err(DomainError::state_conflict(format!(
                "Match {} is {} and no longer accepts responses",
                self.id, self.state
            ))
            .with_detail("state", self.state.as_str()));
        }

        let slot = match side {
            Side::User1 => &mut self.user1_response,
            Side::User2 => &mut self.user2_response,
        };
        if slot.is_some() {
            return Err(DomainError::new(
                ErrorCode::AlreadyResponded,
                format!("User {} already responded to match {}", user, self.id),
            ));
        }
        if now.is_after(&self.expires_at) {
            return Err(DomainError::new(
                ErrorCode::ProposalExpired,
                format!("Match {} expired at {}", self.id, self.expires_at.as_datetime()),
            ));
        }

        *slot = Some(SideResponse {
            response: decision.into(),
            responded_at: now,
        });

        if let (Some(a), Some(b)) = (self.user1_response, self.user2_response) {
            match RejectionReason::from_responses(a.response, b.response) {
                None => {
                    self.state = self.state.transition_to(MatchState::Accepted)?;
                    self.accepted_at = Some(now);
                }
                Some(reason) => {
                    self.state = self.state.transition_to(MatchState::Rejected)?;
                    self.rejection_reason = Some(reason);
                    self.completed_at = Some(now);
                }
            }
        }

        Ok(self.state)
    }

    /// Closes an unanswered proposal after its deadline.
    ///
    /// Sides that never answered are recorded as `Timeout`; existing
    /// answers are kept.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Proposed and past `expires_at`
    pub fn expire(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.state != MatchState::Proposed {
            return Err(DomainError::state_conflict(format!(
                "Match {} is {} and cannot expire",
                self.id, self.state
            )));
        }
        if !self.is_expired(now) {
            return Err(DomainError::state_conflict(format!(
                "Match {} has not reached its deadline",
                self.id
            )));
        }

        self.state = self.state.transition_to(MatchState::Expired)?;
        self.completed_at = Some(now);
        let timeout = SideResponse {
            response: Response::Timeout,
            responded_at: now,
        };
        self.user1_response.get_or_insert(timeout);
        self.user2_response.get_or_insert(timeout);
        Ok(())
    }

    /// Links the session created from this match. Irreversible.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Accepted
    pub fn create_session(&mut self, session_id: SessionId, now: Timestamp) -> Result<(), DomainError> {
        self.state = self.state.transition_to(MatchState::SessionCreated)?;
        self.session_id = Some(session_id);
        self.completed_at = Some(now);
        Ok(())
    }

    /// Gives up on an accepted match whose session could not be set up.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Accepted
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.state = self.state.transition_to(MatchState::Failed)?;
        self.failure_reason = Some(reason.into());
        self.completed_at = Some(now);
        Ok(())
    }

    fn not_participant(&self, user: &UserId) -> DomainError {
        DomainError::new(
            ErrorCode::NotParticipant,
            format!("User {} is not part of match {}", user, self.id),
        )
        .with_detail("match_id", self.id.to_string())
    }
}
