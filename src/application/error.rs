//! Handler error type.
//!
//! Every handler returns `MatchmakingError`. The variant mirrors the
//! `ErrorCategory` of the underlying `DomainError`, so callers can decide
//! between showing a message, refreshing state, or retrying without
//! inspecting codes.

use thiserror::Error;

use crate::domain::foundation::{
    DomainError, ErrorCategory, ErrorCode, MatchId, SessionId, UserId,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchmakingError {
    /// Bad input or a user action that is not allowed (not a participant,
    /// rejection cap reached).
    #[error("Invalid request: {0}")]
    Validation(DomainError),

    /// The entity is not in a state that permits the operation.
    #[error("Invalid state: {0}")]
    StateConflict(DomainError),

    /// Someone else changed the entity first; reload and retry.
    #[error("Concurrent modification: {0}")]
    ConcurrencyConflict(DomainError),

    /// An invariant was violated internally. Never shown to users.
    #[error("Policy violation: {0}")]
    PolicyViolation(DomainError),

    #[error("Not found: {0}")]
    NotFound(DomainError),

    #[error("Infrastructure error: {0}")]
    Infrastructure(DomainError),
}

impl MatchmakingError {
    pub fn candidate_not_found(user_id: &UserId) -> Self {
        Self::NotFound(DomainError::new(
            ErrorCode::CandidateNotFound,
            format!("Candidate not found: {}", user_id),
        ))
    }

    pub fn match_not_found(match_id: &MatchId) -> Self {
        Self::NotFound(DomainError::new(
            ErrorCode::MatchNotFound,
            format!("Match not found: {}", match_id),
        ))
    }

    pub fn session_not_found(session_id: &SessionId) -> Self {
        Self::NotFound(DomainError::new(
            ErrorCode::SessionNotFound,
            format!("Session not found: {}", session_id),
        ))
    }

    /// The wrapped domain error.
    pub fn inner(&self) -> &DomainError {
        match self {
            Self::Validation(e)
            | Self::StateConflict(e)
            | Self::ConcurrencyConflict(e)
            | Self::PolicyViolation(e)
            | Self::NotFound(e)
            | Self::Infrastructure(e) => e,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.inner().code
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// True if retrying against fresh state may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl From<DomainError> for MatchmakingError {
    fn from(err: DomainError) -> Self {
        match err.category() {
            ErrorCategory::Validation => Self::Validation(err),
            ErrorCategory::StateConflict => Self::StateConflict(err),
            ErrorCategory::ConcurrencyConflict => Self::ConcurrencyConflict(err),
            ErrorCategory::PolicyViolation => Self::PolicyViolation(err),
            ErrorCategory::NotFound => Self::NotFound(err),
            ErrorCategory::Infrastructure => Self::Infrastructure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_follow_error_category() {
        let cases = [
            (ErrorCode::NotParticipant, ErrorCategory::Validation),
            (ErrorCode::AlreadyResponded, ErrorCategory::StateConflict),
            (ErrorCode::DuplicateActiveMatch, ErrorCategory::ConcurrencyConflict),
            (ErrorCode::PolicyViolation, ErrorCategory::PolicyViolation),
            (ErrorCode::MatchNotFound, ErrorCategory::NotFound),
            (ErrorCode::DatabaseError, ErrorCategory::Infrastructure),
        ];
        for (code, category) in cases {
            let err = MatchmakingError::from(DomainError::new(code, "x"));
            assert_eq!(err.category(), category);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn only_concurrency_conflicts_are_retryable() {
        let conflict = MatchmakingError::from(DomainError::concurrency_conflict("moved"));
        assert!(conflict.is_retryable());

        let not_found = MatchmakingError::candidate_not_found(&UserId::new("ana").unwrap());
        assert!(!not_found.is_retryable());
        assert_eq!(not_found.code(), ErrorCode::CandidateNotFound);
    }

    #[test]
    fn display_includes_message() {
        let err = MatchmakingError::from(DomainError::state_conflict("already ended"));
        assert!(err.to_string().contains("already ended"));
    }
}
