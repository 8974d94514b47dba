//! ResumeSessionHandler - Resumes a paused session.

use std::sync::Arc;

use tracing::info;

use super::load_for_participant;
use crate::application::MatchmakingError;
use crate::domain::foundation::{CommandMetadata, SerializableDomainEvent, SessionId, UserId};
use crate::domain::session::{Session, SessionResumed};
use crate::ports::{Clock, EventPublisher, SessionRepository};

#[derive(Debug, Clone)]
pub struct ResumeSessionCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
}

pub struct ResumeSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ResumeSessionHandler {
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
        cmd: ResumeSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<Session, MatchmakingError> {
        let now = self.clock.now();
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;

        session.resume(now)?;
        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        self.publisher
            .publish(metadata.stamp(SessionResumed::from_session(&session, now).to_envelope()))
            .await?;

        info!(
            session_id = %session.id(),
            paused_seconds = session.paused_duration_seconds(),
            "session resumed"
        );
        Ok(session)
    }
}
