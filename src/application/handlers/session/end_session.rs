//! EndSessionHandler - Ends a session and settles its participants.

use std::sync::Arc;

use tracing::{debug, info};

use super::load_session;
use crate::application::handlers::settlement::Settlement;
use crate::application::MatchmakingError;
use crate::domain::candidate::Rating;
use crate::domain::foundation::{CommandMetadata, DomainError, SessionId, UserId};
use crate::domain::session::{EndOutcome, EndReason, Session};
use crate::ports::{
    CandidateRepository, Clock, EventPublisher, HistoryRepository, MatchRepository,
    SessionRepository,
};

#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub session_id: SessionId,
    /// The participant ending the session; `None` when the system ends it.
    pub ended_by: Option<UserId>,
    pub reason: EndReason,
    /// Optional 1-5 rating from `ended_by`, stored as their feedback on
    /// the session. The partner can rate later through
    /// `SubmitSessionFeedbackHandler`.
    pub quality_rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EndSessionResult {
    pub session: Session,
    pub outcome: EndOutcome,
}

pub struct EndSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    settlement: Settlement,
    clock: Arc<dyn Clock>,
}

impl EndSessionHandler {
    pub fn new(
        candidates: Arc<dyn CandidateRepository>,
        matches: Arc<dyn MatchRepository>,
        sessions: Arc<dyn SessionRepository>,
        history: Arc<dyn HistoryRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            settlement: Settlement::new(candidates, matches, history, publisher),
            clock,
        }
    }

    /// Ends the session. Ending a session that already ended succeeds
    /// with [`EndOutcome::AlreadyTerminal`] and changes nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session does not exist
    /// - `Validation` if `ended_by` is not a participant, the rating is out
    ///   of range, or a rating comes without `ended_by`
    /// - `ConcurrencyConflict` if the session changed meanwhile
    pub async fn handle(
        &self,
        cmd: EndSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<EndSessionResult, MatchmakingError> {
        let now = self.clock.now();
        let rating = cmd
            .quality_rating
            .map(Rating::new)
            .transpose()
            .map_err(DomainError::from)?;
        if rating.is_some() && cmd.ended_by.is_none() {
            return Err(DomainError::validation(
                "quality_rating",
                "A rating needs the participant who gives it",
            )
            .into());
        }

        let mut session = load_session(self.sessions.as_ref(), &cmd.session_id).await?;
        let outcome = session.end(cmd.reason, cmd.ended_by.as_ref(), now)?;
        if !outcome.ended_now() {
            debug!(session_id = %cmd.session_id, "session already ended");
            return Ok(EndSessionResult { session, outcome });
        }
        if let (Some(rating), Some(user)) = (rating, cmd.ended_by.as_ref()) {
            session.submit_feedback(user, rating, None, now)?;
        }

        let version = self.sessions.update(&session).await?;
        let session = session.with_version(version);

        self.settlement
            .session_ended(&session, now, &metadata)
            .await?;

        info!(
            session_id = %session.id(),
            state = %session.state(),
            reason = %cmd.reason,
            active_seconds = session.active_duration_seconds(),
            correlation_id = metadata.correlation_id(),
            "session ended"
        );
        Ok(EndSessionResult { session, outcome })
    }
}
