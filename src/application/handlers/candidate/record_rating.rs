//! RecordRatingHandler - Adds a partner rating to a candidate.

use std::sync::Arc;

use tracing::debug;

use crate::application::MatchmakingError;
use crate::domain::candidate::{Candidate, Rating};
use crate::domain::foundation::{CommandMetadata, DomainError, UserId};
use crate::ports::{CandidateRepository, Clock};

#[derive(Debug, Clone)]
pub struct RecordRatingCommand {
    /// The user being rated.
    pub user_id: UserId,
    /// Raw rating, must lie in [1, 5].
    pub rating: f64,
}

pub struct RecordRatingHandler {
    candidates: Arc<dyn CandidateRepository>,
    clock: Arc<dyn Clock>,
}

impl RecordRatingHandler {
    pub fn new(candidates: Arc<dyn CandidateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { candidates, clock }
    }

    pub async fn handle(
        &self,
        cmd: RecordRatingCommand,
        metadata: CommandMetadata,
    ) -> Result<Candidate, MatchmakingError> {
        let rating = Rating::new(cmd.rating).map_err(DomainError::from)?;
        let mut candidate = self
            .candidates
            .find_by_user(&cmd.user_id)
            .await?
            .ok_or_else(|| MatchmakingError::candidate_not_found(&cmd.user_id))?;

        candidate.record_rating(rating, self.clock.now());
        let version = self.candidates.update(&candidate).await?;

        debug!(
            user_id = %cmd.user_id,
            average = candidate.average_rating(),
            correlation_id = metadata.correlation_id(),
            "rating recorded"
        );
        Ok(candidate.with_version(version))
    }
}
