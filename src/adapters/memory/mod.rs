//! In-memory repository adapters.
//!
//! Each adapter keeps one `tokio::sync::RwLock<HashMap<..>>`. The version
//! check and the write of a compare-and-set happen under a single write
//! guard, so concurrent handlers observe the same conflicts a database
//! would report. Used by default and by tests.

mod candidate_repository;
mod history_repository;
mod match_repository;
mod session_repository;

pub use candidate_repository::InMemoryCandidateRepository;
pub use history_repository::InMemoryHistoryRepository;
pub use match_repository::InMemoryMatchRepository;
pub use session_repository::InMemorySessionRepository;

use crate::domain::foundation::{DomainError, Version};

/// Shared CAS check: the caller's loaded version must equal the stored one.
pub(crate) fn check_version(
    entity: &str,
    id: &str,
    stored: Version,
    loaded: Version,
) -> Result<Version, DomainError> {
    if stored != loaded {
        return Err(DomainError::concurrency_conflict(format!(
            "{} {} was modified concurrently (stored {}, loaded {})",
            entity, id, stored, loaded
        )));
    }
    Ok(stored.next())
}
