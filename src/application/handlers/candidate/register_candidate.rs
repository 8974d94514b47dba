//! RegisterCandidateHandler - Creates the matchmaking record of a user.

use std::sync::Arc;

use tracing::info;

use crate::application::MatchmakingError;
use crate::domain::candidate::{Candidate, MatchingPreferences, MatchingProfile};
use crate::domain::foundation::{CommandMetadata, UserId};
use crate::ports::{CandidateRepository, Clock};

#[derive(Debug, Clone)]
pub struct RegisterCandidateCommand {
    pub user_id: UserId,
    pub profile: MatchingProfile,
    pub preferences: Option<MatchingPreferences>,
}

pub struct RegisterCandidateHandler {
    candidates: Arc<dyn CandidateRepository>,
    clock: Arc<dyn Clock>,
}

impl RegisterCandidateHandler {
    pub fn new(candidates: Arc<dyn CandidateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { candidates, clock }
    }

    pub async fn handle(
        &self,
        cmd: RegisterCandidateCommand,
        metadata: CommandMetadata,
    ) -> Result<Candidate, MatchmakingError> {
        let mut candidate = Candidate::new(cmd.user_id, cmd.profile, self.clock.now());
        if let Some(preferences) = cmd.preferences {
            candidate = candidate.with_preferences(preferences);
        }

        self.candidates.save(&candidate).await?;

        info!(
            user_id = %candidate.user_id(),
            correlation_id = metadata.correlation_id(),
            "candidate registered"
        );
        Ok(candidate)
    }
}
