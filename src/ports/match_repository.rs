//! Match repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MatchId, Timestamp, UserId, Version};
use crate::domain::proposal::{Match, MatchState};

/// Repository port for Match persistence.
///
/// At most one active (Proposed or Accepted) match may exist for an
/// unordered pair of users. This is checked in `save`, not left to a
/// storage constraint.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Save a new match.
    ///
    /// # Errors
    ///
    /// - `DuplicateActiveMatch` if the pair already has an active match
    /// - `DatabaseError` on persistence failure
    async fn save(&self, m: &Match) -> Result<(), DomainError>;

    /// Compare-and-set update. Returns the new stored version.
    ///
    /// # Errors
    ///
    /// - `MatchNotFound` if the match doesn't exist
    /// - `ConcurrencyConflict` if the stored version moved on
    async fn update(&self, m: &Match) -> Result<Version, DomainError>;

    async fn find_by_id(&self, id: &MatchId) -> Result<Option<Match>, DomainError>;

    /// The active match between two users, in either order.
    async fn find_active_for_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Match>, DomainError>;

    /// Proposed matches whose answer window closed before `now`.
    async fn find_expired_proposals(&self, now: Timestamp) -> Result<Vec<Match>, DomainError>;

    /// All matches currently in `state`.
    async fn find_by_state(&self, state: MatchState) -> Result<Vec<Match>, DomainError>;
}
