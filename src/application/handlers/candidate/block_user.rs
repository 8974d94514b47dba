//! Block list handlers.

use std::sync::Arc;

use tracing::info;

use crate::application::MatchmakingError;
use crate::domain::candidate::Candidate;
use crate::domain::foundation::{CommandMetadata, DomainError, UserId};
use crate::ports::{CandidateRepository, Clock};

#[derive(Debug, Clone)]
pub struct BlockUserCommand {
    pub user_id: UserId,
    pub blocked_user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct UnblockUserCommand {
    pub user_id: UserId,
    pub blocked_user_id: UserId,
}

pub struct BlockUserHandler {
    candidates: Arc<dyn CandidateRepository>,
    clock: Arc<dyn Clock>,
}

impl BlockUserHandler {
    pub fn new(candidates: Arc<dyn CandidateRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { candidates, clock }
    }

    /// Adds a block. Blocking an already blocked user changes nothing.
    pub async fn block(
        &self,
        cmd: BlockUserCommand,
        metadata: CommandMetadata,
    ) -> Result<Candidate, MatchmakingError> {
        let mut candidate = self.load(&cmd.user_id).await?;
        let added = candidate
            .block_user(cmd.blocked_user_id.clone(), self.clock.now())
            .map_err(DomainError::from)?;
        if !added {
            return Ok(candidate);
        }

        let version = self.candidates.update(&candidate).await?;
        info!(
            user_id = %cmd.user_id,
            blocked = %cmd.blocked_user_id,
            correlation_id = metadata.correlation_id(),
            "user blocked"
        );
        Ok(candidate.with_version(version))
    }

    pub async fn unblock(
        &self,
        cmd: UnblockUserCommand,
        metadata: CommandMetadata,
    ) -> Result<Candidate, MatchmakingError> {
        let mut candidate = self.load(&cmd.user_id).await?;
        if !candidate.unblock_user(&cmd.blocked_user_id, self.clock.now()) {
            return Ok(candidate);
        }

        let version = self.candidates.update(&candidate).await?;
        info!(
            user_id = %cmd.user_id,
            unblocked = %cmd.blocked_user_id,
            correlation_id = metadata.correlation_id(),
            "user unblocked"
        );
        Ok(candidate.with_version(version))
    }

    async fn load(&self, user_id: &UserId) -> Result<Candidate, MatchmakingError> {
        self.candidates
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| MatchmakingError::candidate_not_found(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::TestContext;
    use crate::domain::candidate::fixtures::{english_learner, user};

    fn block(by: &str, target: &str) -> BlockUserCommand {
        BlockUserCommand {
            user_id: user(by),
            blocked_user_id: user(target),
        }
    }

    #[tokio::test]
    async fn block_then_unblock() {
        let ctx = TestContext::new();
        ctx.seed(english_learner("ana")).await;
        let handler = BlockUserHandler::new(ctx.candidates.clone(), ctx.clock.clone());

        let candidate = handler.block(block("ana", "ben"), ctx.metadata()).await.unwrap();
        assert!(candidate.has_blocked(&user("ben")));

        let candidate = handler
            .unblock(
                UnblockUserCommand {
                    user_id: user("ana"),
                    blocked_user_id: user("ben"),
                },
                ctx.metadata(),
            )
            .await
            .unwrap();
        assert!(!candidate.has_blocked(&user("ben")));
        assert!(!ctx.candidate("ana").await.has_blocked(&user("ben")));
    }

    #[tokio::test]
    async fn repeated_block_does_not_bump_version() {
        let ctx = TestContext::new();
        ctx.seed(english_learner("ana")).await;
        let handler = BlockUserHandler::new(ctx.candidates.clone(), ctx.clock.clone());

        let first = handler.block(block("ana", "ben"), ctx.metadata()).await.unwrap();
        let second = handler.block(block("ana", "ben"), ctx.metadata()).await.unwrap();
        assert_eq!(first.version(), second.version());
    }

    #[tokio::test]
    async fn blocking_yourself_is_invalid() {
        let ctx = TestContext::new();
        ctx.seed(english_learner("ana")).await;
        let handler = BlockUserHandler::new(ctx.candidates.clone(), ctx.clock.clone());

        let err = handler.block(block("ana", "ana"), ctx.metadata()).await.unwrap_err();
        assert!(matches!(err, MatchmakingError::Validation(_)));
    }
}
