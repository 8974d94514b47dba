//! PauseSessionHandler - Pauses an active session.

use std::sync::Arc;

use tracing::info;

use super::load_for_participant;
use crate::application::MatchmakingError;
use crate::domain::foundation::{CommandMetadata, SerializableDomainEvent, SessionId, UserId};
use crate::domain::session::{Session, SessionPaused};
use crate::ports::{Clock, EventPublisher, SessionRepository};

#[derive(Debug, Clone)]
pub struct PauseSessionCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub reason: String,
}

pub struct PauseSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl PauseSessionHandler {
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

    pub async fn handle(
        &self,
        cmd: PauseSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<Session, MatchmakingError> {
        let now = self.clock.now();
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;

        session.pause(cmd.reason, now)?;
        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        self.publisher
            .publish(metadata.stamp(SessionPaused::from_session(&session, now).to_envelope()))
            .await?;

        info!(session_id = %session.id(), user_id = %cmd.user_id, "session paused");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::TestContext;
    use crate::domain::candidate::fixtures::user;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::session::SessionState;

    fn command(session: &Session, who: &str) -> PauseSessionCommand {
        PauseSessionCommand {
            session_id: session.id(),
            user_id: user(who),
            reason: "break".to_string(),
        }
    }

    #[tokio::test]
    async fn participant_can_pause() {
        let ctx = TestContext::new();
        let session = ctx.seed_session().await;
        ctx.set_secs(60);
        let handler = PauseSessionHandler::new(ctx.sessions.clone(), ctx.bus.clone(), ctx.clock.clone());

        let paused = handler.handle(command(&session, "ben"), ctx.metadata()).await.unwrap();

        assert_eq!(paused.state(), SessionState::Paused);
        assert_eq!(paused.active_duration_seconds(), 60);
        assert_eq!(paused.pause_reason(), Some("break"));
        assert_eq!(ctx.stored_session(session.id()).await.state(), SessionState::Paused);
        assert!(ctx.bus.has_event("session.paused.v1"));
    }

    #[tokio::test]
    async fn outsider_cannot_pause() {
        let ctx = TestContext::new();
        let session = ctx.seed_session().await;
        let handler = PauseSessionHandler::new(ctx.sessions.clone(), ctx.bus.clone(), ctx.clock.clone());

        let err = handler.handle(command(&session, "zed"), ctx.metadata()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotParticipant);
        assert_eq!(ctx.stored_session(session.id()).await.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn pausing_twice_is_a_state_conflict() {
        let ctx = TestContext::new();
        let session = ctx.seed_session().await;
        let handler = PauseSessionHandler::new(ctx.sessions.clone(), ctx.bus.clone(), ctx.clock.clone());

        handler.handle(command(&session, "ana"), ctx.metadata()).await.unwrap();
        let err = handler.handle(command(&session, "ana"), ctx.metadata()).await.unwrap_err();
        assert!(matches!(err, MatchmakingError::StateConflict(_)));
    }
}
