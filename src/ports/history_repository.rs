//! History repository port (append-only).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MatchId};
use crate::domain::history::HistoryRecord;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a record unless one of the same kind exists for its match.
    ///
    /// Returns `false` for a duplicate; the stored record is left untouched.
    async fn append(&self, record: &HistoryRecord) -> Result<bool, DomainError>;

    /// Replaces the feedback and quality of a stored session record.
    ///
    /// Feedback only grows: a record carrying fewer entries than the
    /// stored one is ignored. Returns whether the stored record changed.
    async fn amend_feedback(&self, record: &HistoryRecord) -> Result<bool, DomainError>;

    /// All records for a match, oldest first.
    async fn find_by_match(&self, match_id: &MatchId) -> Result<Vec<HistoryRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn HistoryRepository) {}
    }
}
