//! SubmitSessionFeedbackHandler - Records a participant's rating of a
//! finished session and folds it into the session's history record.

use std::sync::Arc;

use tracing::{debug, info};

use super::load_for_participant;
use crate::application::MatchmakingError;
use crate::domain::candidate::Rating;
use crate::domain::foundation::{
    CommandMetadata, DomainError, SerializableDomainEvent, SessionId, UserId,
};
use crate::domain::history::HistoryKind;
use crate::domain::session::{Session, SessionFeedbackSubmitted};
use crate::ports::{Clock, EventPublisher, HistoryRepository, SessionRepository};

#[derive(Debug, Clone)]
pub struct SubmitSessionFeedbackCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// 1.0 to 5.0
    pub rating: f64,
    pub comment: Option<String>,
}

pub struct SubmitSessionFeedbackHandler {
    sessions: Arc<dyn SessionRepository>,
    history: Arc<dyn HistoryRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl SubmitSessionFeedbackHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        history: Arc<dyn HistoryRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            history,
            publisher,
            clock,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    /// - `Validation` if the user is not a participant or the rating is out
    ///   of range
    /// - `StateConflict` while the session is live, or if this participant
    ///   already rated it
    /// - `ConcurrencyConflict` if the session changed meanwhile
    pub async fn handle(
        &self,
        cmd: SubmitSessionFeedbackCommand,
        metadata: CommandMetadata,
    ) -> Result<Session, MatchmakingError> {
        let now = self.clock.now();
        let rating = Rating::new(cmd.rating).map_err(DomainError::from)?;
        let mut session =
            load_for_participant(self.sessions.as_ref(), &cmd.session_id, &cmd.user_id).await?;

        session.submit_feedback(&cmd.user_id, rating, cmd.comment, now)?;
        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        // The session record is written when the session ends; amend it
        // with the fuller feedback.
        let records = self.history.find_by_match(&session.match_id()).await?;
        match records.into_iter().find(|r| r.kind() == HistoryKind::Session) {
            Some(record) => {
                let amended = record.with_feedback_from(&session)?;
                self.history.amend_feedback(&amended).await?;
            }
            None => debug!(session_id = %session.id(), "no session history to amend yet"),
        }

        self.publisher
            .publish(metadata.stamp(
                SessionFeedbackSubmitted::new(&session, &cmd.user_id, rating.value(), now)
                    .to_envelope(),
            ))
            .await?;

        info!(
            session_id = %session.id(),
            user_id = %cmd.user_id,
            average_quality = session.average_quality(),
            "session feedback recorded"
        );
        Ok(session)
    }
}
