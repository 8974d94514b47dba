//! Candidate repository port.
//!
//! One record per user. `update` is a compare-and-set on the candidate's
//! version and is the only way the matchmaker claims a queued candidate.

use async_trait::async_trait;

use crate::domain::candidate::Candidate;
use crate::domain::foundation::{DomainError, UserId, Version};

/// Repository port for Candidate persistence.
///
/// Implementations must ensure:
/// - `update` succeeds only if the stored version equals `candidate.version()`
/// - the stored version is incremented on every successful update
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Save a new candidate.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a candidate already exists for the user
    /// - `DatabaseError` on persistence failure
    async fn save(&self, candidate: &Candidate) -> Result<(), DomainError>;

    /// Compare-and-set update. Returns the new stored version.
    ///
    /// # Errors
    ///
    /// - `CandidateNotFound` if no candidate exists for the user
    /// - `ConcurrencyConflict` if the stored version moved on
    /// - `DatabaseError` on persistence failure
    async fn update(&self, candidate: &Candidate) -> Result<Version, DomainError>;

    /// Find the candidate of a user.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Candidate>, DomainError>;

    /// All candidates currently in the Queued state, in no particular order.
    async fn find_queued(&self) -> Result<Vec<Candidate>, DomainError>;

    /// Number of queued candidates.
    async fn count_queued(&self) -> Result<usize, DomainError>;

    /// All candidates held by a match (Proposed or Matched).
    async fn find_committed(&self) -> Result<Vec<Candidate>, DomainError>;
}
