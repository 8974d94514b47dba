//! Candidate aggregate entity.
//!
//! One candidate exists per user. It records whether the user may be
//! matched right now, their standing (ratings, strikes, cooldowns) and
//! which match, if any, currently holds them.
//!
//! Time-based state (cooldowns, the daily rejection counter) is evaluated
//! lazily against the `now` passed to each operation; nothing here flips
//! on its own.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CandidateStatus, MatchingPreferences, MatchingProfile, Rating, RatingAccumulator};
use crate::domain::foundation::{
    DomainError, ErrorCode, MatchId, StateMachine, Timestamp, UserId, ValidationError, Version,
};

/// Strikes at which a candidate is suspended.
pub const STRIKE_LIMIT: u32 = 3;

/// Suspension applied on reaching the strike limit.
pub const STRIKE_COOLDOWN_HOURS: i64 = 24;

pub const STRIKE_COOLDOWN_REASON: &str = "excessive_strikes";
pub const REJECTION_COOLDOWN_REASON: &str = "rejection";

/// Position in the matchmaking queue. Present iff the candidate is Queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub queued_at: Timestamp,
    pub priority: i32,
}

/// Candidate aggregate - a user's matchmaking eligibility record.
///
/// # Invariants
///
/// - `queue` is `Some` iff `status == Queued`
/// - `status == Cooldown` implies `cooldown_until` is set
/// - `strike_count >= 3` implies the candidate is never available
/// - `current_match` is set while Proposed or Matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    user_id: UserId,
    status: CandidateStatus,
    queue: Option<QueueEntry>,

    profile: MatchingProfile,
    preferences: MatchingPreferences,

    ratings: RatingAccumulator,
    strike_count: u32,
    successful_matches: u32,
    last_match_at: Option<Timestamp>,
    blocked_user_ids: BTreeSet<UserId>,

    cooldown_until: Option<Timestamp>,
    cooldown_reason: Option<String>,

    rejection_count_today: u32,
    last_rejection_reset: Timestamp,

    current_match: Option<MatchId>,

    version: Version,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Candidate {
    /// Registers a new, idle candidate.
    pub fn new(user_id: UserId, profile: MatchingProfile, now: Timestamp) -> Self {
        Self {
            user_id,
            status: CandidateStatus::Idle,
            queue: None,
            profile,
            preferences: MatchingPreferences::default(),
            ratings: RatingAccumulator::new(),
            strike_count: 0,
            successful_matches: 0,
            last_match_at: None,
            blocked_user_ids: BTreeSet::new(),
            cooldown_until: None,
            cooldown_reason: None,
            rejection_count_today: 0,
            last_rejection_reset: now,
            current_match: None,
            version: Version::initial(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: replace the matching preferences.
    pub fn with_preferences(mut self, preferences: MatchingPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Returns a copy carrying the given stored version. Used by adapters.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    pub fn queue_entry(&self) -> Option<QueueEntry> {
        self.queue
    }

    pub fn queued_at(&self) -> Option<Timestamp> {
        self.queue.map(|q| q.queued_at)
    }

    pub fn queue_priority(&self) -> Option<i32> {
        self.queue.map(|q| q.priority)
    }

    pub fn profile(&self) -> &MatchingProfile {
        &self.profile
    }

    pub fn preferences(&self) -> &MatchingPreferences {
        &self.preferences
    }

    /// Mean received rating in [1, 5]; 5.0 before the first rating.
    pub fn average_rating(&self) -> f64 {
        self.ratings.average()
    }

    pub fn total_ratings(&self) -> u32 {
        self.ratings.count()
    }

    pub fn strike_count(&self) -> u32 {
        self.strike_count
    }

    pub fn successful_matches(&self) -> u32 {
        self.successful_matches
    }

    pub fn last_match_at(&self) -> Option<Timestamp> {
        self.last_match_at
    }

    pub fn blocked_user_ids(&self) -> &BTreeSet<UserId> {
        &self.blocked_user_ids
    }

    pub fn cooldown_until(&self) -> Option<Timestamp> {
        self.cooldown_until
    }

    pub fn cooldown_reason(&self) -> Option<&str> {
        self.cooldown_reason.as_deref()
    }

    pub fn rejection_count_today(&self) -> u32 {
        self.rejection_count_today
    }

    pub fn current_match(&self) -> Option<MatchId> {
        self.current_match
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Eligibility
    // ─────────────────────────────────────────────────────────────────────────

    /// True while a cooldown deadline lies in the future.
    pub fn is_in_cooldown(&self, now: Timestamp) -> bool {
        self.cooldown_until.is_some_and(|until| now.is_before(&until))
    }

    /// True if the candidate may join the queue.
    pub fn is_available(&self, now: Timestamp) -> bool {
        self.status == CandidateStatus::Idle
            && !self.is_in_cooldown(now)
            && self.strike_count < STRIKE_LIMIT
    }

    /// True if the matchmaker may propose this candidate.
    pub fn is_matchable(&self, now: Timestamp) -> bool {
        self.status == CandidateStatus::Queued
            && !self.is_in_cooldown(now)
            && self.strike_count < STRIKE_LIMIT
            && self.current_match.is_none()
    }

    /// True if this candidate is held by the given match.
    pub fn is_committed_to(&self, match_id: &MatchId) -> bool {
        self.status.is_committed() && self.current_match.as_ref() == Some(match_id)
    }

    pub fn has_blocked(&self, user_id: &UserId) -> bool {
        self.blocked_user_ids.contains(user_id)
    }

    /// True if neither side has blocked the other.
    pub fn is_mutually_unblocked(&self, other: &Candidate) -> bool {
        !self.has_blocked(&other.user_id) && !other.has_blocked(&self.user_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queue
    // ─────────────────────────────────────────────────────────────────────────

    /// Joins the matchmaking queue.
    ///
    /// An elapsed cooldown is cleared first.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the candidate is available
    pub fn enqueue(&mut self, priority: i32, now: Timestamp) -> Result<(), DomainError> {
        self.refresh_cooldown(now);
        if !self.is_available(now) {
            return Err(DomainError::state_conflict(format!(
                "Candidate {} is not available for matching ({})",
                self.user_id, self.status
            ))
            .with_detail("status", self.status.as_str()));
        }

        self.status = self.status.transition_to(CandidateStatus::Queued)?;
        self.queue = Some(QueueEntry {
            queued_at: now,
            priority,
        });
        self.touch(now);
        Ok(())
    }

    /// Leaves the queue.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Queued
    pub fn dequeue(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != CandidateStatus::Queued {
            return Err(DomainError::state_conflict(format!(
                "Candidate {} is not queued",
                self.user_id
            )));
        }
        self.status = self.status.transition_to(CandidateStatus::Idle)?;
        self.queue = None;
        self.touch(now);
        Ok(())
    }

    /// True if queued for longer than `ttl_secs`.
    pub fn is_queue_stale(&self, ttl_secs: i64, now: Timestamp) -> bool {
        self.status == CandidateStatus::Queued
            && self
                .queued_at()
                .is_some_and(|at| now.seconds_since(&at) > ttl_secs)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Match commitment
    // ─────────────────────────────────────────────────────────────────────────

    /// Reserves this candidate for a proposal.
    ///
    /// Returns the queue entry that was given up so a half-completed claim
    /// can be undone with [`Candidate::release_to_queue`].
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the candidate is matchable
    pub fn claim_for_proposal(
        &mut self,
        match_id: MatchId,
        now: Timestamp,
    ) -> Result<QueueEntry, DomainError> {
        let entry = match (self.is_matchable(now), self.queue) {
            (true, Some(entry)) => entry,
            _ => {
                return Err(DomainError::state_conflict(format!(
                    "Candidate {} cannot be claimed ({})",
                    self.user_id, self.status
                )))
            }
        };

        self.status = self.status.transition_to(CandidateStatus::Proposed)?;
        self.queue = None;
        self.current_match = Some(match_id);
        self.touch(now);
        Ok(entry)
    }

    /// Undoes a claim, restoring the original queue position.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Proposed
    pub fn release_to_queue(&mut self, entry: QueueEntry, now: Timestamp) -> Result<(), DomainError> {
        if self.status != CandidateStatus::Proposed {
            return Err(DomainError::state_conflict(format!(
                "Candidate {} holds no claim to release",
                self.user_id
            )));
        }
        self.status = self.status.transition_to(CandidateStatus::Queued)?;
        self.queue = Some(entry);
        self.current_match = None;
        self.touch(now);
        Ok(())
    }

    /// Records that the proposal became a session.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Proposed
    pub fn mark_matched(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status != CandidateStatus::Proposed {
            return Err(DomainError::state_conflict(format!(
                "Candidate {} is not in a proposal",
                self.user_id
            )));
        }
        self.status = self.status.transition_to(CandidateStatus::Matched)?;
        self.successful_matches += 1;
        self.last_match_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Releases the candidate after a match or session ends.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Proposed or Matched
    pub fn return_to_idle(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if !self.status.is_committed() {
            return Err(DomainError::state_conflict(format!(
                "Candidate {} is not committed to a match ({})",
                self.user_id, self.status
            )));
        }
        self.status = self.status.transition_to(CandidateStatus::Idle)?;
        self.current_match = None;
        self.touch(now);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Standing
    // ─────────────────────────────────────────────────────────────────────────

    /// Suspends matchmaking for `duration`, from any status.
    pub fn apply_cooldown(&mut self, duration: Duration, reason: impl Into<String>, now: Timestamp) {
        self.status = CandidateStatus::Cooldown;
        self.queue = None;
        self.current_match = None;
        self.cooldown_until = Some(now.plus(duration));
        self.cooldown_reason = Some(reason.into());
        self.touch(now);
    }

    /// Returns a candidate with an elapsed cooldown to Idle.
    ///
    /// Candidates at the strike limit stay suspended. Returns whether the
    /// status changed.
    pub fn refresh_cooldown(&mut self, now: Timestamp) -> bool {
        if self.status != CandidateStatus::Cooldown
            || self.is_in_cooldown(now)
            || self.strike_count >= STRIKE_LIMIT
        {
            return false;
        }
        self.status = CandidateStatus::Idle;
        self.cooldown_until = None;
        self.cooldown_reason = None;
        self.touch(now);
        true
    }

    pub fn record_rating(&mut self, rating: Rating, now: Timestamp) {
        self.ratings.record(rating);
        self.touch(now);
    }

    /// Adds a strike. Returns true if it triggered the strike suspension.
    pub fn record_strike(&mut self, now: Timestamp) -> bool {
        self.strike_count += 1;
        if self.strike_count >= STRIKE_LIMIT {
            self.apply_cooldown(
                Duration::hours(STRIKE_COOLDOWN_HOURS),
                STRIKE_COOLDOWN_REASON,
                now,
            );
            return true;
        }
        self.touch(now);
        false
    }

    /// Blocks another user from ever being paired with this one.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if a user tries to block themselves
    pub fn block_user(&mut self, user_id: UserId, now: Timestamp) -> Result<bool, ValidationError> {
        if user_id == self.user_id {
            return Err(ValidationError::invalid_format(
                "blocked_user_id",
                "cannot block yourself",
            ));
        }
        let added = self.blocked_user_ids.insert(user_id);
        self.touch(now);
        Ok(added)
    }

    /// Removes a block. Returns whether one existed.
    pub fn unblock_user(&mut self, user_id: &UserId, now: Timestamp) -> bool {
        let removed = self.blocked_user_ids.remove(user_id);
        if removed {
            self.touch(now);
        }
        removed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Daily rejection cap
    // ─────────────────────────────────────────────────────────────────────────

    /// True if another rejection is allowed today.
    ///
    /// Resets the counter when the UTC day has rolled over since the last
    /// reset, so the caller must persist the candidate afterwards.
    pub fn can_reject_more_today(&mut self, max_per_day: u32, now: Timestamp) -> bool {
        self.reset_rejections_if_new_day(now);
        self.rejection_count_today < max_per_day
    }

    pub fn record_rejection(&mut self, now: Timestamp) {
        self.reset_rejections_if_new_day(now);
        self.rejection_count_today += 1;
        self.touch(now);
    }

    fn reset_rejections_if_new_day(&mut self, now: Timestamp) {
        if self.last_rejection_reset.utc_date() < now.utc_date() {
            self.rejection_count_today = 0;
            self.last_rejection_reset = now;
        }
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::candidate::profile::fixtures::profile;
    use crate::domain::candidate::CefrLevel;

    pub const T0: i64 = 1_705_276_800; // 2024-01-15T00:00:00Z

    pub fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(T0 + secs)
    }

    pub fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    /// English speaker learning Spanish at B1.
    pub fn english_learner(id: &str) -> Candidate {
        Candidate::new(user(id), profile("en", "es", CefrLevel::B1), at(0))
    }

    /// Spanish speaker learning English at B2.
    pub fn spanish_learner(id: &str) -> Candidate {
        Candidate::new(user(id), profile("es", "en", CefrLevel::B2), at(0))
    }

    pub fn queued(mut candidate: Candidate, priority: i32, secs: i64) -> Candidate {
        candidate.enqueue(priority, at(secs)).unwrap();
        candidate
    }
}
