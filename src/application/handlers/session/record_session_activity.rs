//! RecordSessionActivityHandler - Heartbeats, messages and typing updates.

use std::sync::Arc;

use tracing::trace;

use super::load_session;
use crate::application::MatchmakingError;
use crate::domain::foundation::{CommandMetadata, SessionId, UserId};
use crate::domain::session::Session;
use crate::ports::{Clock, SessionRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionActivity {
    Heartbeat,
    Message,
    Typing(bool),
}

#[derive(Debug, Clone)]
pub struct RecordSessionActivityCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub activity: SessionActivity,
}

pub struct RecordSessionActivityHandler {
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl RecordSessionActivityHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    pub async fn handle(
        &self,
        cmd: RecordSessionActivityCommand,
        metadata: CommandMetadata,
    ) -> Result<Session, MatchmakingError> {
        let now = self.clock.now();
        let mut session = load_session(self.sessions.as_ref(), &cmd.session_id).await?;

        match cmd.activity {
            SessionActivity::Heartbeat => session.record_activity(&cmd.user_id, now)?,
            SessionActivity::Message => session.record_message(&cmd.user_id, now)?,
            SessionActivity::Typing(typing) => session.set_typing(&cmd.user_id, typing, now)?,
        }
        let version = self.sessions.update(&session).await?;

        trace!(
            session_id = %cmd.session_id,
            user_id = %cmd.user_id,
            activity = ?cmd.activity,
            correlation_id = metadata.correlation_id(),
            "session activity"
        );
        Ok(session.with_version(version))
    }
}
