//! Session repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MatchId, SessionId, Version};
use crate::domain::session::Session;

/// Repository port for Session persistence.
///
/// Implementations must ensure:
/// - at most one session per match
/// - `update` is a compare-and-set on the session version
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the match already has a session
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Compare-and-set update. Returns the new stored version.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if session doesn't exist
    /// - `ConcurrencyConflict` if the stored version moved on
    async fn update(&self, session: &Session) -> Result<Version, DomainError>;

    /// Find a session by its ID.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// The session created from a match, if any.
    async fn find_by_match(&self, match_id: &MatchId) -> Result<Option<Session>, DomainError>;

    /// All Active or Paused sessions.
    async fn find_live(&self) -> Result<Vec<Session>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn session_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SessionRepository) {}
    }
}
