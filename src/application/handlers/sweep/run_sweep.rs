//! RunSweepHandler - Applies every transition that is due at `now`.
//!
//! Domain objects only answer "is this due?"; the sweep is what actually
//! expires proposals, ends stale sessions and drops stale queue entries.
//! It also repairs what a handler left half done: accepted matches that
//! never got a session, and candidates still held by a match that has
//! closed. Each entity is stored under its own compare-and-set. One that
//! changed since it was read is skipped and looked at again on the next
//! pass.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::handlers::settlement::Settlement;
use crate::application::MatchmakingError;
use crate::config::{MatchingConfig, SessionConfig};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCategory, Timestamp,
};
use crate::domain::candidate::Candidate;
use crate::domain::proposal::{
    Match, MatchExpired, MatchFailed, MatchState, Response, SESSION_SETUP_FAILED,
};
use crate::domain::session::{EndReason, Session, TurnSwitchSuggested};
use crate::ports::{
    CandidateRepository, Clock, EventPublisher, HistoryRepository, MatchRepository,
    SessionRepository,
};

/// What one sweep pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_matches: usize,
    /// Accepted matches given up because no session was set up in time.
    pub failed_matches: usize,
    pub ended_sessions: usize,
    /// Live sessions past their planned length. Informational only.
    pub overdue_sessions: usize,
    pub turn_switch_suggestions: usize,
    pub dequeued_candidates: usize,
    /// Candidates whose release, penalty or match commitment was applied
    /// late, after the handler that owed it failed to.
    pub repaired_candidates: usize,
    /// Entities skipped because they changed during the pass.
    pub conflicts: usize,
}

pub struct RunSweepHandler {
    candidates: Arc<dyn CandidateRepository>,
    matches: Arc<dyn MatchRepository>,
    sessions: Arc<dyn SessionRepository>,
    settlement: Settlement,
    clock: Arc<dyn Clock>,
    matching: MatchingConfig,
    session_config: SessionConfig,
}

impl RunSweepHandler {
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
        let settlement = Settlement::new(candidates.clone(), matches.clone(), history, publisher);
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

    /// Runs one pass.
    ///
    /// # Errors
    ///
    /// Infrastructure failures abort the pass; conflicts are counted.
    pub async fn handle(&self, metadata: CommandMetadata) -> Result<SweepReport, MatchmakingError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        // 1. Proposals past their answer window
        for m in self.matches.find_expired_proposals(now).await? {
            let match_id = m.id();
            match self.expire_match(m, now, &metadata).await {
                Ok(()) => report.expired_matches += 1,
                Err(e) => absorb(&mut report, "match", &match_id.to_string(), e)?,
            }
        }

        // 2. Accepted matches that never got their session
        for m in self.matches.find_by_state(MatchState::Accepted).await? {
            let stalled = m
                .accepted_at()
                .is_some_and(|at| now.duration_since(&at) > self.matching.repair_after());
            if !stalled {
                continue;
            }
            let match_id = m.id();
            match self.fail_stalled_acceptance(m, now, &metadata).await {
                Ok(()) => report.failed_matches += 1,
                Err(e) => absorb(&mut report, "match", &match_id.to_string(), e)?,
            }
        }

        // 3. Live sessions
        for session in self.sessions.find_live().await? {
            let session_id = session.id();
            match self.sweep_session(session, now, &metadata, &mut report).await {
                Ok(()) => {}
                Err(e) => absorb(&mut report, "session", &session_id.to_string(), e)?,
            }
        }

        // 4. Queue entries past the queue TTL
        for mut candidate in self.candidates.find_queued().await? {
            if !candidate.is_queue_stale(self.matching.queue_ttl_secs, now) {
                continue;
            }
            let user_id = candidate.user_id().clone();
            let result = match candidate.dequeue(now) {
                Ok(()) => self.candidates.update(&candidate).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    debug!(user_id = %user_id, "stale queue entry dropped");
                    report.dequeued_candidates += 1;
                }
                Err(e) => absorb(&mut report, "candidate", user_id.as_str(), e)?,
            }
        }

        // 5. Candidates still held by a match that has closed
        for candidate in self.candidates.find_committed().await? {
            let user_id = candidate.user_id().clone();
            match self.repair_candidate(candidate, now).await {
                Ok(true) => report.repaired_candidates += 1,
                Ok(false) => {}
                Err(e) => absorb(&mut report, "candidate", user_id.as_str(), e)?,
            }
        }

        if report != SweepReport::default() {
            info!(
                expired_matches = report.expired_matches,
                failed_matches = report.failed_matches,
                ended_sessions = report.ended_sessions,
                overdue_sessions = report.overdue_sessions,
                turn_switch_suggestions = report.turn_switch_suggestions,
                dequeued_candidates = report.dequeued_candidates,
                repaired_candidates = report.repaired_candidates,
                conflicts = report.conflicts,
                correlation_id = metadata.correlation_id(),
                "sweep complete"
            );
        }
        Ok(report)
    }

    async fn expire_match(
        &self,
        mut m: Match,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<(), DomainError> {
        m.expire(now)?;
        let version = self.matches.update(&m).await?;
        let m = m.with_version(version);

        self.settlement
            .release_pair(m.user1(), m.user2(), &m.id(), now)
            .await;
        self.settlement.record_match_history(&m, now, metadata).await?;
        self.settlement
            .publish(MatchExpired::from_match(&m, now), metadata)
            .await?;

        info!(match_id = %m.id(), "proposal expired");
        Ok(())
    }

    /// Gives up on an accepted match whose session was never linked. A
    /// session saved before the failure is ended unannounced.
    async fn fail_stalled_acceptance(
        &self,
        mut m: Match,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<(), DomainError> {
        if let Some(mut orphan) = self.sessions.find_by_match(&m.id()).await? {
            if orphan.end(EndReason::TechnicalError, None, now)?.ended_now() {
                self.sessions.update(&orphan).await?;
            }
        }

        m.fail(SESSION_SETUP_FAILED, now)?;
        let version = self.matches.update(&m).await?;
        let m = m.with_version(version);

        self.settlement
            .release_pair(m.user1(), m.user2(), &m.id(), now)
            .await;
        self.settlement.record_match_history(&m, now, metadata).await?;
        self.settlement
            .publish(MatchFailed::from_match(&m, now), metadata)
            .await?;

        warn!(match_id = %m.id(), reason = SESSION_SETUP_FAILED, "accepted match failed");
        Ok(())
    }

    /// Applies the follow-up a closed match still owes this candidate.
    /// Returns whether anything changed.
    ///
    /// Candidates touched within the repair window are left to the handler
    /// that is presumably still working on them.
    async fn repair_candidate(&self, candidate: Candidate, now: Timestamp) -> Result<bool, DomainError> {
        if now.duration_since(&candidate.updated_at()) <= self.matching.repair_after() {
            return Ok(false);
        }
        let Some(match_id) = candidate.current_match() else {
            return Ok(false);
        };
        let user = candidate.user_id();

        let Some(m) = self.matches.find_by_id(&match_id).await? else {
            return self.settlement.release_candidate(user, &match_id, now).await;
        };
        let repaired = match m.state() {
            MatchState::Proposed | MatchState::Accepted => false,
            MatchState::Rejected if m.response_of(user) == Some(Response::Rejected) => {
                self.settlement
                    .penalise_rejection(user, &match_id, self.matching.rejection_cooldown(), now)
                    .await?
            }
            MatchState::Rejected | MatchState::Expired | MatchState::Failed => {
                self.settlement.release_candidate(user, &match_id, now).await?
            }
            MatchState::SessionCreated => {
                let live = match m.session_id() {
                    Some(id) => self
                        .sessions
                        .find_by_id(&id)
                        .await?
                        .is_some_and(|s| !s.is_terminal()),
                    None => false,
                };
                if live {
                    self.settlement.mark_matched(user, &match_id, now).await?
                } else {
                    self.settlement.release_candidate(user, &match_id, now).await?
                }
            }
        };
        if repaired {
            info!(user_id = %user, match_id = %match_id, state = %m.state(), "candidate repaired");
        }
        Ok(repaired)
    }

    /// Ends a session that ran too long or went quiet; otherwise checks
    /// whether it is overdue or due a turn switch.
    async fn sweep_session(
        &self,
        mut session: Session,
        now: Timestamp,
        metadata: &CommandMetadata,
        report: &mut SweepReport,
    ) -> Result<(), DomainError> {
        let reason = if session.exceeds_max_duration(self.session_config.max_duration(), now) {
            Some(EndReason::MaximumDuration)
        } else if session.is_idle(self.session_config.idle_timeout(), now) {
            Some(EndReason::Inactivity)
        } else {
            None
        };

        if let Some(reason) = reason {
            let outcome = session.end(reason, None, now)?;
            if !outcome.ended_now() {
                return Ok(());
            }
            let version = self.sessions.update(&session).await?;
            let session = session.with_version(version);
            self.settlement
                .session_ended(&session, now, metadata)
                .await?;
            info!(session_id = %session.id(), reason = %reason, "session ended by sweep");
            report.ended_sessions += 1;
            return Ok(());
        }

        if session.is_overdue(now) {
            report.overdue_sessions += 1;
        }
        if session.should_suggest_turn_switch(self.session_config.turn_switch_interval(), now) {
            session.record_turn_switch_suggestion(now);
            let version = self.sessions.update(&session).await?;
            let session = session.with_version(version);
            self.settlement
                .publish(TurnSwitchSuggested::from_session(&session, now), metadata)
                .await?;
            report.turn_switch_suggestions += 1;
        }
        Ok(())
    }
}

/// Counts a lost race and moves on; anything else ends the pass.
fn absorb(
    report: &mut SweepReport,
    entity: &str,
    id: &str,
    error: DomainError,
) -> Result<(), MatchmakingError> {
    match error.category() {
        ErrorCategory::ConcurrencyConflict | ErrorCategory::StateConflict => {
            debug!(entity, id, error = %error, "skipped; changed during sweep");
            report.conflicts += 1;
            Ok(())
        }
        _ => Err(error.into()),
    }
}
