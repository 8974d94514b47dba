//! EnqueueCandidateHandler - Puts an available candidate into the queue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::MatchmakingError;
use crate::config::MatchingConfig;
use crate::domain::candidate::{Candidate, CandidateQueued};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventId, SerializableDomainEvent, UserId,
};
use crate::ports::{CandidateRepository, Clock, EventPublisher};

#[derive(Debug, Clone)]
pub struct EnqueueCandidateCommand {
    pub user_id: UserId,
    /// Higher priorities are matched first.
    pub priority: i32,
}

pub struct EnqueueCandidateHandler {
    candidates: Arc<dyn CandidateRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    config: MatchingConfig,
}

impl EnqueueCandidateHandler {
    pub fn new(
        candidates: Arc<dyn CandidateRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            candidates,
            publisher,
            clock,
            config,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` if the user has no candidate record
    /// - `StateConflict` (`QueueFull`) at the configured queue size
    /// - `StateConflict` if the candidate is not available
    /// - `ConcurrencyConflict` if the candidate changed meanwhile
    pub async fn handle(
        &self,
        cmd: EnqueueCandidateCommand,
        metadata: CommandMetadata,
    ) -> Result<Candidate, MatchmakingError> {
        let now = self.clock.now();
        let mut candidate = self
            .candidates
            .find_by_user(&cmd.user_id)
            .await?
            .ok_or_else(|| MatchmakingError::candidate_not_found(&cmd.user_id))?;

        let queued = self.candidates.count_queued().await?;
        if queued >= self.config.max_queue_size {
            warn!(user_id = %cmd.user_id, queued, "matchmaking queue is full");
            return Err(DomainError::new(
                ErrorCode::QueueFull,
                format!("Queue is full ({} candidates)", queued),
            )
            .into());
        }

        candidate.enqueue(cmd.priority, now).map_err(|e| {
            warn!(user_id = %cmd.user_id, error = %e, "enqueue rejected");
            e
        })?;
        let version = self.candidates.update(&candidate).await?;
        let candidate = candidate.with_version(version);

        let event = CandidateQueued {
            event_id: EventId::new(),
            user_id: candidate.user_id().clone(),
            priority: cmd.priority,
            queued_at: now,
        };
        self.publisher
            .publish(metadata.stamp(event.to_envelope()))
            .await?;

        info!(user_id = %candidate.user_id(), priority = cmd.priority, "candidate queued");
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::TestContext;
    use crate::domain::candidate::fixtures::{english_learner, queued, spanish_learner, user};
    use crate::domain::candidate::CandidateStatus;

    fn handler(ctx: &TestContext) -> EnqueueCandidateHandler {
        EnqueueCandidateHandler::new(
            ctx.candidates.clone(),
            ctx.bus.clone(),
            ctx.clock.clone(),
            ctx.config.matching.clone(),
        )
    }

    fn command(id: &str) -> EnqueueCandidateCommand {
        EnqueueCandidateCommand {
            user_id: user(id),
            priority: 0,
        }
    }

    #[tokio::test]
    async fn queues_candidate_and_publishes_event() {
        let ctx = TestContext::new();
        ctx.seed(english_learner("ana")).await;

        let candidate = handler(&ctx)
            .handle(command("ana"), ctx.metadata())
            .await
            .unwrap();

        assert_eq!(candidate.status(), CandidateStatus::Queued);
        assert_eq!(candidate.version(), ctx.candidate("ana").await.version());
        let events = ctx.bus.events_of_type("candidate.queued.v1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].aggregate_id, "ana");
    }

    #[tokio::test]
    async fn unknown_candidate_is_not_found() {
        let ctx = TestContext::new();
        let err = handler(&ctx)
            .handle(command("ghost"), ctx.metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchmakingError::NotFound(_)));
    }

    #[tokio::test]
    async fn full_queue_rejects_new_entries() {
        let mut ctx = TestContext::new();
        ctx.config.matching.max_queue_size = 1;
        ctx.seed(queued(english_learner("ana"), 0, 0)).await;
        ctx.seed(spanish_learner("ben")).await;

        let err = handler(&ctx)
            .handle(command("ben"), ctx.metadata())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::QueueFull);
        assert_eq!(ctx.candidate("ben").await.status(), CandidateStatus::Idle);
        assert!(!ctx.bus.has_event("candidate.queued.v1"));
    }

    #[tokio::test]
    async fn already_queued_is_a_state_conflict() {
        let ctx = TestContext::new();
        ctx.seed(queued(english_learner("ana"), 0, 0)).await;

        let err = handler(&ctx)
            .handle(command("ana"), ctx.metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchmakingError::StateConflict(_)));
    }
}
