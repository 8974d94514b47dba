//! Immutable history snapshots of finished matches and sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, HistoryRecordId, MatchId, SessionId, StateMachine, Timestamp, UserId,
};
use crate::domain::proposal::Match;
use crate::domain::scoring::MatchingFactors;
use crate::domain::session::{Session, SessionFeedback, SessionState};

/// Which terminal transition produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Match,
    Session,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Match => "match",
            HistoryKind::Session => "session",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Write-once snapshot for analytics and future tuning of the scorer.
///
/// Records are keyed by `(kind, match_id)`. The only later change is
/// participant feedback on a session record, which may arrive after the
/// session ended; see [`HistoryRecord::with_feedback_from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    id: HistoryRecordId,
    kind: HistoryKind,
    match_id: MatchId,
    session_id: Option<SessionId>,
    user1: UserId,
    user2: UserId,
    final_state: String,
    match_score: f64,
    factors: MatchingFactors,
    response_latency_seconds: Option<i64>,
    session_completed: bool,
    session_duration_minutes: Option<f64>,
    session_quality: Option<f64>,
    #[serde(default)]
    user_feedback: Vec<SessionFeedback>,
    recorded_at: Timestamp,
}

impl HistoryRecord {
    /// Snapshot of a match that reached Rejected, Expired or SessionCreated.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the match is still open
    pub fn for_match(m: &Match, now: Timestamp) -> Result<Self, DomainError> {
        if !m.state().is_terminal() {
            return Err(DomainError::state_conflict(format!(
                "Match {} is still {}",
                m.id(),
                m.state()
            )));
        }
        Ok(Self {
            id: HistoryRecordId::new(),
            kind: HistoryKind::Match,
            match_id: m.id(),
            session_id: m.session_id(),
            user1: m.user1().clone(),
            user2: m.user2().clone(),
            final_state: m.state().to_string(),
            match_score: m.score(),
            factors: m.factors().clone(),
            response_latency_seconds: m.response_latency(),
            session_completed: false,
            session_duration_minutes: None,
            session_quality: None,
            user_feedback: Vec::new(),
            recorded_at: now,
        })
    }

    /// Snapshot of a finished session. Quality is the mean of whatever
    /// ratings the participants have given so far.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session is still live
    /// - `ValidationFailed` if the session does not belong to the match
    pub fn for_session(m: &Match, session: &Session, now: Timestamp) -> Result<Self, DomainError> {
        if !session.is_terminal() {
            return Err(DomainError::state_conflict(format!(
                "Session {} is still {}",
                session.id(),
                session.state()
            )));
        }
        if session.match_id() != m.id() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Session {} was not created from match {}", session.id(), m.id()),
            ));
        }
        Ok(Self {
            id: HistoryRecordId::new(),
            kind: HistoryKind::Session,
            match_id: m.id(),
            session_id: Some(session.id()),
            user1: session.user1().clone(),
            user2: session.user2().clone(),
            final_state: session.state().to_string(),
            match_score: m.score(),
            factors: m.factors().clone(),
            response_latency_seconds: m.response_latency(),
            session_completed: session.state() == SessionState::Ended,
            session_duration_minutes: Some(session.stats().duration_minutes()),
            session_quality: session.average_quality(),
            user_feedback: session.feedback().to_vec(),
            recorded_at: now,
        })
    }

    /// Copy of this session record carrying the session's current feedback
    /// and the recomputed average quality.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` unless this is the session record of `session`
    pub fn with_feedback_from(mut self, session: &Session) -> Result<Self, DomainError> {
        if self.kind != HistoryKind::Session || self.session_id != Some(session.id()) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Record {} is not the history of session {}", self.id, session.id()),
            ));
        }
        self.user_feedback = session.feedback().to_vec();
        self.session_quality = session.average_quality();
        Ok(self)
    }

    pub fn id(&self) -> HistoryRecordId {
        self.id
    }

    pub fn kind(&self) -> HistoryKind {
        self.kind
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn user1(&self) -> &UserId {
        &self.user1
    }

    pub fn user2(&self) -> &UserId {
        &self.user2
    }

    pub fn final_state(&self) -> &str {
        &self.final_state
    }

    pub fn match_score(&self) -> f64 {
        self.match_score
    }

    pub fn factors(&self) -> &MatchingFactors {
        &self.factors
    }

    pub fn response_latency_seconds(&self) -> Option<i64> {
        self.response_latency_seconds
    }

    pub fn session_completed(&self) -> bool {
        self.session_completed
    }

    pub fn session_duration_minutes(&self) -> Option<f64> {
        self.session_duration_minutes
    }

    pub fn session_quality(&self) -> Option<f64> {
        self.session_quality
    }

    pub fn user_feedback(&self) -> &[SessionFeedback] {
        &self.user_feedback
    }

    pub fn recorded_at(&self) -> Timestamp {
        self.recorded_at
    }
}
