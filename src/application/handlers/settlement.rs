//! Follow-up work shared by the handlers that close matches and sessions.
//!
//! Releasing candidates, writing history and publishing events happen after
//! the owning aggregate has been stored. Each candidate is updated under its
//! own compare-and-set; a failure there is logged and does not undo the
//! transition that caused it. The sweep later finds candidates left behind
//! this way and applies the same follow-ups through the helpers below.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::candidate::{Candidate, CandidateStatus, REJECTION_COOLDOWN_REASON};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, MatchId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::domain::history::{HistoryRecord, HistoryRecorded};
use crate::domain::proposal::Match;
use crate::domain::session::{Session, SessionEnded};
use crate::ports::{CandidateRepository, EventPublisher, HistoryRepository, MatchRepository};

#[derive(Clone)]
pub(crate) struct Settlement {
    candidates: Arc<dyn CandidateRepository>,
    matches: Arc<dyn MatchRepository>,
    history: Arc<dyn HistoryRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl Settlement {
    pub(crate) fn new(
        candidates: Arc<dyn CandidateRepository>,
        matches: Arc<dyn MatchRepository>,
        history: Arc<dyn HistoryRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            candidates,
            matches,
            history,
            publisher,
        }
    }

    /// Loads a candidate, applies `change`, and stores it if `change`
    /// reports a modification. Returns the candidate as stored.
    pub(crate) async fn update_candidate<F>(
        &self,
        user: &UserId,
        change: F,
    ) -> Result<Candidate, DomainError>
    where
        F: FnOnce(&mut Candidate) -> Result<bool, DomainError> + Send,
    {
        let mut candidate = self.candidates.find_by_user(user).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::CandidateNotFound,
                format!("Candidate not found: {}", user),
            )
        })?;
        if !change(&mut candidate)? {
            return Ok(candidate);
        }
        let version = self.candidates.update(&candidate).await?;
        Ok(candidate.with_version(version))
    }

    /// Returns a candidate held by `match_id` to Idle. Candidates that have
    /// since moved on (cooldown, another match) are left alone. Returns
    /// whether the candidate was released.
    pub(crate) async fn release_candidate(
        &self,
        user: &UserId,
        match_id: &MatchId,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut released = false;
        self.update_candidate(user, |c| {
            if !c.is_committed_to(match_id) {
                return Ok(false);
            }
            c.return_to_idle(now)?;
            released = true;
            Ok(true)
        })
        .await?;
        Ok(released)
    }

    /// [`Settlement::release_candidate`], logging instead of failing.
    pub(crate) async fn release(&self, user: &UserId, match_id: &MatchId, now: Timestamp) {
        if let Err(e) = self.release_candidate(user, match_id, now).await {
            warn!(user_id = %user, match_id = %match_id, error = %e, "candidate release failed");
        }
    }

    /// Counts the rejection and cools the candidate down, once per match:
    /// a candidate no longer held by `match_id` is left alone. Returns
    /// whether the penalty was applied.
    pub(crate) async fn penalise_rejection(
        &self,
        user: &UserId,
        match_id: &MatchId,
        cooldown: Duration,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut applied = false;
        let candidate = self
            .update_candidate(user, |c| {
                if !c.is_committed_to(match_id) {
                    return Ok(false);
                }
                c.record_rejection(now);
                c.apply_cooldown(cooldown, REJECTION_COOLDOWN_REASON, now);
                applied = true;
                Ok(true)
            })
            .await?;
        if applied {
            debug!(
                user_id = %user,
                rejections_today = candidate.rejection_count_today(),
                "rejection cooldown applied"
            );
        }
        Ok(applied)
    }

    /// Moves a candidate still proposed for `match_id` to Matched.
    pub(crate) async fn mark_matched(
        &self,
        user: &UserId,
        match_id: &MatchId,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut marked = false;
        self.update_candidate(user, |c| {
            if !c.is_committed_to(match_id) || c.status() != CandidateStatus::Proposed {
                return Ok(false);
            }
            c.mark_matched(now)?;
            marked = true;
            Ok(true)
        })
        .await?;
        Ok(marked)
    }

    pub(crate) async fn release_pair(&self, a: &UserId, b: &UserId, match_id: &MatchId, now: Timestamp) {
        self.release(a, match_id, now).await;
        self.release(b, match_id, now).await;
    }

    /// Appends a history record and announces it if it was new.
    pub(crate) async fn record_history(
        &self,
        record: HistoryRecord,
        metadata: &CommandMetadata,
    ) -> Result<bool, DomainError> {
        let appended = self.history.append(&record).await?;
        if appended {
            self.publish(HistoryRecorded::from_record(&record), metadata)
                .await?;
        } else {
            debug!(
                match_id = %record.match_id(),
                kind = %record.kind(),
                "history already recorded"
            );
        }
        Ok(appended)
    }

    pub(crate) async fn record_match_history(
        &self,
        m: &Match,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<bool, DomainError> {
        self.record_history(HistoryRecord::for_match(m, now)?, metadata)
            .await
    }

    /// Settles a session that has just ended: frees both candidates,
    /// snapshots history and announces the end.
    pub(crate) async fn session_ended(
        &self,
        session: &Session,
        now: Timestamp,
        metadata: &CommandMetadata,
    ) -> Result<(), DomainError> {
        self.release_pair(session.user1(), session.user2(), &session.match_id(), now)
            .await;

        match self.matches.find_by_id(&session.match_id()).await? {
            Some(m) => {
                let record = HistoryRecord::for_session(&m, session, now)?;
                self.record_history(record, metadata).await?;
            }
            None => warn!(
                session_id = %session.id(),
                match_id = %session.match_id(),
                "session ended without its match; history skipped"
            ),
        }

        self.publish(SessionEnded::from_session(session, now), metadata)
            .await
    }

    pub(crate) async fn publish<E: SerializableDomainEvent>(
        &self,
        event: E,
        metadata: &CommandMetadata,
    ) -> Result<(), DomainError> {
        self.publisher
            .publish(metadata.stamp(event.to_envelope()))
            .await
    }
}
