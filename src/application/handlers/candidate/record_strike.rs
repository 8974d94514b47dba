//! RecordStrikeHandler - Records a conduct strike against a candidate.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::MatchmakingError;
use crate::domain::candidate::Candidate;
use crate::domain::foundation::{CommandMetadata, UserId};
use crate::ports::{CandidateRepository, Clock};

#[derive(Debug, Clone)]
pub struct RecordStrikeCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct RecordStrikeResult {
    pub candidate: Candidate,
    /// True if this strike triggered the strike suspension.
    pub suspended: bool,
}

pub struct RecordStrikeHandler {
    candidates: Arc<dyn CandidateRepository>,
    clock: Arc<dyn Clock>,
}

impl RecordStrikeHandler {
    pub fn new(candidates: Arc<dyn CandidateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { candidates, clock }
    }

    pub async fn handle(
        &self,
        cmd: RecordStrikeCommand,
        metadata: CommandMetadata,
    ) -> Result<RecordStrikeResult, MatchmakingError> {
        let mut candidate = self
            .candidates
            .find_by_user(&cmd.user_id)
            .await?
            .ok_or_else(|| MatchmakingError::candidate_not_found(&cmd.user_id))?;

        let suspended = candidate.record_strike(self.clock.now());
        let version = self.candidates.update(&candidate).await?;

        if suspended {
            warn!(
                user_id = %cmd.user_id,
                strikes = candidate.strike_count(),
                correlation_id = metadata.correlation_id(),
                "strike limit reached; candidate suspended"
            );
        } else {
            info!(user_id = %cmd.user_id, strikes = candidate.strike_count(), "strike recorded");
        }

        Ok(RecordStrikeResult {
            candidate: candidate.with_version(version),
            suspended,
        })
    }
}
