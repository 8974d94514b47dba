//! DequeueCandidateHandler - Takes a candidate out of the queue.

use std::sync::Arc;

use tracing::info;

use crate::application::MatchmakingError;
use crate::domain::candidate::Candidate;
use crate::domain::foundation::{CommandMetadata, UserId};
use crate::ports::{CandidateRepository, Clock};

#[derive(Debug, Clone)]
pub struct DequeueCandidateCommand {
    pub user_id: UserId,
}

pub struct DequeueCandidateHandler {
    candidates: Arc<dyn CandidateRepository>,
    clock: Arc<dyn Clock>,
}

impl DequeueCandidateHandler {
    pub fn new(candidates: Arc<dyn CandidateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { candidates, clock }
    }

    pub async fn handle(
        &self,
        cmd: DequeueCandidateCommand,
        metadata: CommandMetadata,
    ) -> Result<Candidate, MatchmakingError> {
        let mut candidate = self
            .candidates
            .find_by_user(&cmd.user_id)
            .await?
            .ok_or_else(|| MatchmakingError::candidate_not_found(&cmd.user_id))?;

        candidate.dequeue(self.clock.now())?;
        let version = self.candidates.update(&candidate).await?;

        info!(
            user_id = %cmd.user_id,
            correlation_id = metadata.correlation_id(),
            "candidate left the queue"
        );
        Ok(candidate.with_version(version))
    }
}
