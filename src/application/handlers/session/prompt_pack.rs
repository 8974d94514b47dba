//! PromptPackHandler - Loads conversation prompts into a session and
//! steps through them.

use std::sync::Arc;

use tracing::{debug, info};

use super::load_for_participant;
use crate::application::MatchmakingError;
use crate::domain::foundation::{
    CommandMetadata, PromptPackId, SerializableDomainEvent, SessionId, UserId,
};
use crate::domain::session::{PromptAdvanced, Session};
use crate::ports::{Clock, EventPublisher, SessionRepository};

#[derive(Debug, Clone)]
pub struct AssignPromptPackCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub pack_id: PromptPackId,
    pub prompts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AdvancePromptCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct AdvancePromptResult {
    pub session: Session,
    /// False when the session was already on its last prompt.
    pub advanced: bool,
}

pub struct PromptPackHandler {
    sessions: Arc<dyn SessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl PromptPackHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            publisher,
            clock,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    /// - `Validation` if the user is not a participant
    /// - `StateConflict` if the session has ended
    pub async fn assign(
        &self,
        cmd: AssignPromptPackCommand,
        metadata: CommandMetadata,
    ) -> Result<Session, MatchmakingError> {
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;

        session.assign_prompt_pack(cmd.pack_id, cmd.prompts)?;
        let version = self.sessions.update(&session).await?;

        debug!(
            session_id = %cmd.session_id,
            pack_id = %cmd.pack_id,
            prompts = session.prompts_used().len(),
            correlation_id = metadata.correlation_id(),
            "prompt pack loaded"
        );
        Ok(session.with_version(version))
    }

    /// Moves the session to its next prompt. Staying on the last prompt is
    /// not an error and publishes nothing.
    pub async fn advance(
        &self,
        cmd: AdvancePromptCommand,
        metadata: CommandMetadata,
    ) -> Result<AdvancePromptResult, MatchmakingError> {
        let now = self.clock.now();
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;

        if !session.advance_prompt()? {
            return Ok(AdvancePromptResult {
                session,
                advanced: false,
            });
        }
        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        self.publisher
            .publish(metadata.stamp(PromptAdvanced::from_session(&session, now).to_envelope()))
            .await?;

        info!(
            session_id = %session.id(),
            prompt_index = session.current_prompt_index(),
            "prompt advanced"
        );
        Ok(AdvancePromptResult {
            session,
            advanced: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::TestContext;
    use crate::domain::candidate::fixtures::user;
    use crate::domain::foundation::ErrorCode;

    fn handler(ctx: &TestContext) -> PromptPackHandler {
        PromptPackHandler::new(ctx.sessions.clone(), ctx.bus.clone(), ctx.clock.clone())
    }

    fn advance(session: &Session) -> AdvancePromptCommand {
        AdvancePromptCommand {
            session_id: session.id(),
            user_id: user("ben"),
        }
    }

    #[tokio::test]
    async fn prompts_advance_until_the_last_one() {
        let ctx = TestContext::new();
        let session = ctx.seed_session().await;
        let h = handler(&ctx);

        let loaded = h
            .assign(
                AssignPromptPackCommand {
                    session_id: session.id(),
                    user_id: user("ana"),
                    pack_id: PromptPackId::new(),
                    prompts: vec!["Describe your town".into(), "Plan a weekend".into()],
                },
                ctx.metadata(),
            )
            .await
            .unwrap();
        assert_eq!(loaded.current_prompt(), Some("Describe your town"));

        let first = h.advance(advance(&session), ctx.metadata()).await.unwrap();
        assert!(first.advanced);
        assert_eq!(first.session.current_prompt(), Some("Plan a weekend"));

        let second = h.advance(advance(&session), ctx.metadata()).await.unwrap();
        assert!(!second.advanced);

        let stored = ctx.stored_session(session.id()).await;
        assert_eq!(stored.current_prompt_index(), 1);
        assert_eq!(stored.stats().prompts_used_count, 2);
        assert_eq!(ctx.bus.events_of_type("session.prompt_advanced.v1").len(), 1);
    }

    #[tokio::test]
    async fn outsiders_cannot_steer_prompts() {
        let ctx = TestContext::new();
        let session = ctx.seed_session().await;

        let err = handler(&ctx)
            .advance(
                AdvancePromptCommand {
                    session_id: session.id(),
                    user_id: user("zed"),
                },
                ctx.metadata(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotParticipant);
    }
}
