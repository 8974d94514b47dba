//! SwitchTurnHandler - Swaps the practice language of a session.

use std::sync::Arc;

use tracing::{debug, info};

use super::load_for_participant;
use crate::application::MatchmakingError;
use crate::domain::foundation::{CommandMetadata, SerializableDomainEvent, SessionId, UserId};
use crate::domain::session::{Session, TurnLanguage, TurnSwitched};
use crate::ports::{Clock, EventPublisher, SessionRepository};

#[derive(Debug, Clone)]
pub struct SwitchTurnCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct SetAutoTurnSwitchCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct SwitchTurnResult {
    pub session: Session,
    pub turn: TurnLanguage,
}

pub struct SwitchTurnHandler {
    sessions: Arc<dyn SessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl SwitchTurnHandler {
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
        cmd: SwitchTurnCommand,
        metadata: CommandMetadata,
    ) -> Result<SwitchTurnResult, MatchmakingError> {
        let now = self.clock.now();
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;

        let turn = session.switch_turn(now)?;
        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        self.publisher
            .publish(metadata.stamp(TurnSwitched::from_session(&session, now).to_envelope()))
            .await?;

        info!(
            session_id = %session.id(),
            turn = ?turn,
            language = %session.language_for_turn(),
            "turn switched"
        );
        Ok(SwitchTurnResult { session, turn })
    }

    /// Turns the periodic switch suggestion on or off.
    pub async fn set_auto(
        &self,
        cmd: SetAutoTurnSwitchCommand,
        metadata: CommandMetadata,
    ) -> Result<Session, MatchmakingError> {
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;
        if session.auto_turn_switch() == cmd.enabled {
            return Ok(session);
        }

        session.set_auto_turn_switch(cmd.enabled);
        let version = self.sessions.update(&session).await?;

        debug!(
            session_id = %cmd.session_id,
            enabled = cmd.enabled,
            correlation_id = metadata.correlation_id(),
            "auto turn switch updated"
        );
        Ok(session.with_version(version))
    }
}
