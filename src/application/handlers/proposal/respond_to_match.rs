//! RespondToMatchHandler - Records a user's answer to a proposal and
//! carries out whatever the answer resolves.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::handlers::settlement::Settlement;
use crate::application::MatchmakingError;
use crate::config::{MatchingConfig, SessionConfig};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, MatchId, SessionId, Timestamp, UserId,
};
use crate::domain::proposal::{Decision, Match, MatchResolved, MatchState};
use crate::domain::session::{Session, SessionStarted};
use crate::ports::{
    CandidateRepository, Clock, EventPublisher, HistoryRepository, MatchRepository,
    SessionRepository,
};

#[derive(Debug, Clone)]
pub struct RespondToMatchCommand {
    pub match_id: MatchId,
    pub user_id: UserId,
    pub decision: Decision,
    /// Planned session length if this answer starts a session. Falls back
    /// to the shorter of the participants' preferred lengths, then to the
    /// configured default.
    pub planned_minutes: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RespondToMatchResult {
    /// The match after this response (Proposed while the partner has not
    /// answered yet).
    pub match_state: MatchState,
    /// The session started by this response, if any.
    pub session: Option<Session>,
}

pub struct RespondToMatchHandler {
    candidates: Arc<dyn CandidateRepository>,
    matches: Arc<dyn MatchRepository>,
    sessions: Arc<dyn SessionRepository>,
    settlement: Settlement,
    clock: Arc<dyn Clock>,
    matching: MatchingConfig,
    session_config: SessionConfig,
}

impl RespondToMatchHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        candidates: Arc<dyn CandidateRepository>,
        matches: Arc<dyn MatchRepository>,
        sessions: Arc<dyn SessionRepository>,
        history: Arc<dyn HistoryRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        matching: MatchingConfig,
        session_config: SessionConfig,
    ) -> Self {
        let settlement = Settlement::new(
            candidates.clone(),
            matches.clone(),
            history,
            publisher,
        );
        Self {
            candidates,
            matches,
            sessions,
            settlement,
            clock,
            matching,
            session_config,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` if the match does not exist
    /// - `Validation` (`NotParticipant`, `RejectionLimitReached`)
    /// - `StateConflict` if the match is resolved, expired, or this user
    ///   already answered
    /// - `ConcurrencyConflict` if the partner's answer landed first; retry
    ///   against the fresh match
    ///
    /// A failure while setting up the session leaves the match Accepted;
    /// the sweep fails it and frees both users.
    pub async fn handle(
        &self,
        cmd: RespondToMatchCommand,
        metadata: CommandMetadata,
    ) -> Result<RespondToMatchResult, MatchmakingError> {
        let now = self.clock.now();

        // 1. Load the match
        let mut m = self
            .matches
            .find_by_id(&cmd.match_id)
            .await?
            .ok_or_else(|| MatchmakingError::match_not_found(&cmd.match_id))?;

        // 2. Apply the response to the loaded copy; this checks the match
        //    still takes answers from this user
        let state = m.record_response(&cmd.user_id, cmd.decision, now).map_err(|e| {
            warn!(match_id = %cmd.match_id, user_id = %cmd.user_id, error = %e, "response rejected");
            e
        })?;

        // 3. Enforce the daily rejection cap, then store under compare-and-set
        if cmd.decision == Decision::Reject {
            self.check_rejection_cap(&cmd.user_id, now).await?;
        }
        let version = self.matches.update(&m).await?;
        let m = m.with_version(version);

        info!(
            match_id = %m.id(),
            user_id = %cmd.user_id,
            decision = ?cmd.decision,
            state = %state,
            correlation_id = metadata.correlation_id(),
            "match response recorded"
        );

        // 4. Carry out the resolution
        match state {
            MatchState::Accepted => {
                self.settlement
                    .publish(MatchResolved::from_match(&m, now), &metadata)
                    .await?;
                let planned = match cmd.planned_minutes {
                    Some(minutes) => minutes,
                    None => self.preferred_minutes(&m).await?,
                };
                let match_id = m.id();
                let session = self
                    .start_session(m, planned, now, &metadata)
                    .await
                    .map_err(|e| {
                        error!(match_id = %match_id, error = %e, "session setup failed");
                        e
                    })?;
                Ok(RespondToMatchResult {
                    match_state: MatchState::SessionCreated,
                    session: Some(session),
                })
            }
            MatchState::Rejected => {
                self.settlement
                    .publish(MatchResolved::from_match(&m, now), &metadata)
                    .await?;
                self.settle_rejection(&m, now, &metadata).await?;
                Ok(RespondToMatchResult {
                    match_state: state,
                    session: None,
                })
            }
            _ => Ok(RespondToMatchResult {
                match_state: state,
                session: None,
            }),
        }
    }

    async fn check_rejection_cap(&self, user: &UserId, now: Timestamp) -> Result<(), MatchmakingError> {
        let mut candidate = self
            .candidates
            .find_by_user(user)
            .await?
            .ok_or_else(|| MatchmakingError::candidate_not_found(user))?;

        if !candidate.can_reject_more_today(self.matching.max_rejections_per_day, now) {
            warn!(
                user_id = %user,
                rejections_today = candidate.rejection_count_today(),
                "daily rejection limit reached"
            );
            return Err(DomainError::new(
                ErrorCode::RejectionLimitReached,
                format!(
                    "User {} has used all {} rejections for today",
                    user, self.matching.max_rejections_per_day
                ),
            )
            .into());
        }
        Ok(())
    }

    /// The shorter of the two preferred session lengths, or the configured
    /// default when neither participant has one.
    async fn preferred_minutes(&self, m: &Match) -> Result<u32, DomainError> {
        let mut preferred = Vec::with_capacity(2);
        for user in [m.user1(), m.user2()] {
            if let Some(c) = self.candidates.find_by_user(user).await? {
                preferred.extend(c.preferences().preferred_session_minutes);
            }
        }
        Ok(preferred
            .into_iter()
            .filter(|&minutes| minutes > 0)
            .min()
            .unwrap_or(self.session_config.default_planned_minutes))
    }

    /// Starts the session for an accepted match, links it and commits
    /// both candidates to it.
    async fn start_session(
        &self,
        mut m: Match,
        planned_minutes: u32,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<Session, DomainError> {
        let session = Session::start(SessionId::new(), &m, planned_minutes, now)?;
        self.sessions.save(&session).await?;

        m.create_session(session.id(), now)?;
        let version = self.matches.update(&m).await?;
        let m = m.with_version(version);

        let match_id = m.id();
        for user in [m.user1(), m.user2()] {
            if let Err(e) = self.settlement.mark_matched(user, &match_id, now).await {
                warn!(user_id = %user, match_id = %match_id, error = %e, "could not mark candidate matched");
            }
        }

        self.settlement.record_match_history(&m, now, metadata).await?;
        self.settlement
            .publish(SessionStarted::from_session(&session), metadata)
            .await?;

        info!(
            match_id = %match_id,
            session_id = %session.id(),
            room_id = session.room_id(),
            "session started"
        );
        Ok(session)
    }

    /// Penalises the rejecting side(s) and frees the other.
    async fn settle_rejection(
        &self,
        m: &Match,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<(), DomainError> {
        let Some(reason) = m.rejection_reason() else {
            return Ok(());
        };
        let cooldown = self.matching.rejection_cooldown();
        let sides = [
            (m.user1(), reason.user1_rejected()),
            (m.user2(), reason.user2_rejected()),
        ];

        for (user, rejected) in sides {
            if !rejected {
                self.settlement.release(user, &m.id(), now).await;
                continue;
            }
            if let Err(e) = self
                .settlement
                .penalise_rejection(user, &m.id(), cooldown, now)
                .await
            {
                warn!(user_id = %user, error = %e, "could not apply rejection cooldown");
            }
        }

        self.settlement.record_match_history(m, now, metadata).await?;
        Ok(())
    }
}
