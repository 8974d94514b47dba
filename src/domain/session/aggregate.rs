//! Session aggregate entity.
//!
//! A session is the live conversation created from an accepted match. It
//! tracks turn-taking, pauses, participant activity and moderation flags.
//!
//! Durations are accrued at transition points only. The current segment
//! (active or paused) is open until the next pause, resume or end.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{EndOutcome, EndReason, ModerationFlag, ModerationKind, SessionState, TurnLanguage};
use crate::domain::candidate::{LanguageCode, Rating};
use crate::domain::foundation::{
    DomainError, ErrorCode, MatchId, PromptPackId, SessionId, StateMachine, Timestamp, UserId,
    Version,
};
use crate::domain::proposal::{Match, MatchState, Side};

/// Default planned session length in minutes.
pub const DEFAULT_PLANNED_MINUTES: u32 = 25;

/// Language configuration of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLanguages {
    pub primary: LanguageCode,
    pub secondary: LanguageCode,
    pub user1_native: LanguageCode,
    pub user2_native: LanguageCode,
}

impl SessionLanguages {
    fn from_match(m: &Match) -> Self {
        let pair = m.languages();
        Self {
            primary: pair.primary.clone(),
            secondary: pair.secondary.clone(),
            user1_native: pair.primary.clone(),
            user2_native: pair.secondary.clone(),
        }
    }
}

/// Presence and engagement of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParticipantActivity {
    pub last_seen: Option<Timestamp>,
    pub typing: bool,
    pub message_count: u32,
}

/// A participant's rating of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFeedback {
    pub user_id: UserId,
    pub rating: f64,
    pub comment: Option<String>,
    pub submitted_at: Timestamp,
}

/// Summary counters for display and history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_messages: u32,
    pub user1_messages: u32,
    pub user2_messages: u32,
    pub active_duration_seconds: i64,
    pub paused_duration_seconds: i64,
    pub turn_switches: u32,
    pub toxicity_warnings: u32,
    pub moderation_flags: usize,
    pub prompts_used_count: usize,
}

impl SessionStats {
    pub fn duration_minutes(&self) -> f64 {
        self.active_duration_seconds as f64 / 60.0
    }
}

/// Session aggregate - a conversation between two matched users.
///
/// # Invariants
///
/// - exactly one session per match
/// - `paused_at` is set iff Paused
/// - `ended_at` and `end_reason` are set iff terminal
/// - active and paused durations are disjoint and never decrease
/// - the moderation log is append-only
/// - at most one feedback entry per participant, only once terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    match_id: MatchId,
    user1: UserId,
    user2: UserId,
    room_id: String,
    languages: SessionLanguages,
    planned_duration_minutes: u32,

    state: SessionState,
    turn: TurnLanguage,
    turn_switched_at: Option<Timestamp>,
    turn_switch_count: u32,
    auto_turn_switch: bool,
    #[serde(default)]
    last_turn_switch_suggested_at: Option<Timestamp>,

    #[serde(default)]
    prompt_pack_id: Option<PromptPackId>,
    #[serde(default)]
    prompts_used: Vec<String>,
    #[serde(default)]
    current_prompt_index: usize,

    user1_activity: ParticipantActivity,
    user2_activity: ParticipantActivity,
    total_messages: u32,

    toxicity_warnings: u32,
    moderation_flags: Vec<ModerationFlag>,

    active_duration_seconds: i64,
    paused_duration_seconds: i64,
    started_at: Timestamp,
    segment_started_at: Timestamp,
    paused_at: Option<Timestamp>,
    pause_reason: Option<String>,
    last_activity_at: Timestamp,
    ended_at: Option<Timestamp>,
    end_reason: Option<EndReason>,
    ended_by: Option<UserId>,
    #[serde(default)]
    feedback: Vec<SessionFeedback>,

    version: Version,
}

impl Session {
    /// Starts the session for an accepted match.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the match is Accepted
    /// - `ValidationFailed` if `planned_minutes` is zero
    pub fn start(
        id: SessionId,
        source: &Match,
        planned_minutes: u32,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        if source.state() != MatchState::Accepted {
            return Err(DomainError::state_conflict(format!(
                "Match {} is {}; only accepted matches start sessions",
                source.id(),
                source.state()
            )));
        }
        if planned_minutes == 0 {
            return Err(DomainError::validation(
                "planned_duration_minutes",
                "Planned duration must be at least one minute",
            ));
        }

        Ok(Self {
            id,
            match_id: source.id(),
            user1: source.user1().clone(),
            user2: source.user2().clone(),
            room_id: format!("room_{}", Uuid::new_v4().simple()),
            languages: SessionLanguages::from_match(source),
            planned_duration_minutes: planned_minutes,
            state: SessionState::Active,
            turn: TurnLanguage::User1Native,
            turn_switched_at: None,
            turn_switch_count: 0,
            auto_turn_switch: true,
            last_turn_switch_suggested_at: None,
            prompt_pack_id: None,
            prompts_used: Vec::new(),
            current_prompt_index: 0,
            user1_activity: ParticipantActivity::default(),
            user2_activity: ParticipantActivity::default(),
            total_messages: 0,
            toxicity_warnings: 0,
            moderation_flags: Vec::new(),
            active_duration_seconds: 0,
            paused_duration_seconds: 0,
            started_at: now,
            segment_started_at: now,
            paused_at: None,
            pause_reason: None,
            last_activity_at: now,
            ended_at: None,
            end_reason: None,
            ended_by: None,
            feedback: Vec::new(),
            version: Version::initial(),
        })
    }

    /// Returns a copy carrying the given stored version. Used by adapters.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn user1(&self) -> &UserId {
        &self.user1
    }

    pub fn user2(&self) -> &UserId {
        &self.user2
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn languages(&self) -> &SessionLanguages {
        &self.languages
    }

    pub fn planned_duration_minutes(&self) -> u32 {
        self.planned_duration_minutes
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn turn(&self) -> TurnLanguage {
        self.turn
    }

    pub fn turn_switched_at(&self) -> Option<Timestamp> {
        self.turn_switched_at
    }

    pub fn turn_switch_count(&self) -> u32 {
        self.turn_switch_count
    }

    pub fn auto_turn_switch(&self) -> bool {
        self.auto_turn_switch
    }

    pub fn last_turn_switch_suggested_at(&self) -> Option<Timestamp> {
        self.last_turn_switch_suggested_at
    }

    pub fn prompt_pack_id(&self) -> Option<PromptPackId> {
        self.prompt_pack_id
    }

    pub fn prompts_used(&self) -> &[String] {
        &self.prompts_used
    }

    pub fn current_prompt_index(&self) -> usize {
        self.current_prompt_index
    }

    pub fn toxicity_warnings(&self) -> u32 {
        self.toxicity_warnings
    }

    pub fn moderation_flags(&self) -> &[ModerationFlag] {
        &self.moderation_flags
    }

    pub fn total_messages(&self) -> u32 {
        self.total_messages
    }

    pub fn active_duration_seconds(&self) -> i64 {
        self.active_duration_seconds
    }

    pub fn paused_duration_seconds(&self) -> i64 {
        self.paused_duration_seconds
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn paused_at(&self) -> Option<Timestamp> {
        self.paused_at
    }

    pub fn pause_reason(&self) -> Option<&str> {
        self.pause_reason.as_deref()
    }

    pub fn last_activity_at(&self) -> Timestamp {
        self.last_activity_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn ended_by(&self) -> Option<&UserId> {
        self.ended_by.as_ref()
    }

    pub fn feedback(&self) -> &[SessionFeedback] {
        &self.feedback
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Activity record of a participant.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this session
    pub fn activity_of(&self, user: &UserId) -> Result<&ParticipantActivity, DomainError> {
        match self.side_of(user)? {
            Side::User1 => Ok(&self.user1_activity),
            Side::User2 => Ok(&self.user2_activity),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_participant(&self, user: &UserId) -> bool {
        user == &self.user1 || user == &self.user2
    }

    /// The other participant.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this session
    pub fn partner_of(&self, user: &UserId) -> Result<&UserId, DomainError> {
        match self.side_of(user)? {
            Side::User1 => Ok(&self.user2),
            Side::User2 => Ok(&self.user1),
        }
    }

    /// Language both participants should currently be speaking.
    pub fn language_for_turn(&self) -> &LanguageCode {
        match self.turn {
            TurnLanguage::User1Native => &self.languages.user1_native,
            TurnLanguage::User2Native => &self.languages.user2_native,
            TurnLanguage::Mixed => &self.languages.primary,
        }
    }

    /// True if a live session has run past its planned length.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        !self.is_terminal()
            && now.seconds_since(&self.started_at) > i64::from(self.planned_duration_minutes) * 60
    }

    /// True if a live session has run past the hard duration cap.
    pub fn exceeds_max_duration(&self, max: Duration, now: Timestamp) -> bool {
        !self.is_terminal() && now.duration_since(&self.started_at) > max
    }

    /// True if a live session has seen no activity for longer than `timeout`.
    pub fn is_idle(&self, timeout: Duration, now: Timestamp) -> bool {
        !self.is_terminal() && now.duration_since(&self.last_activity_at) > timeout
    }

    /// Planned time left, zero once overdue or terminal.
    pub fn time_remaining(&self, now: Timestamp) -> Duration {
        if self.is_terminal() {
            return Duration::zero();
        }
        let planned = Duration::minutes(i64::from(self.planned_duration_minutes));
        (planned - now.duration_since(&self.started_at)).max(Duration::zero())
    }

    /// True when the participants should be nudged to swap languages.
    ///
    /// Counts from the later of the last switch and the last nudge, so each
    /// interval yields one nudge. A session that has never switched is
    /// never nudged.
    pub fn should_suggest_turn_switch(&self, interval: Duration, now: Timestamp) -> bool {
        if self.is_terminal() || !self.auto_turn_switch {
            return false;
        }
        let Some(switched_at) = self.turn_switched_at else {
            return false;
        };
        let since = self
            .last_turn_switch_suggested_at
            .map_or(switched_at, |suggested| suggested.max(switched_at));
        now.duration_since(&since) > interval
    }

    /// The prompt the participants are on, if a pack is loaded.
    pub fn current_prompt(&self) -> Option<&str> {
        self.prompts_used
            .get(self.current_prompt_index)
            .map(String::as_str)
    }

    /// Mean of the participants' ratings, if anyone rated.
    pub fn average_quality(&self) -> Option<f64> {
        if self.feedback.is_empty() {
            return None;
        }
        let total: f64 = self.feedback.iter().map(|f| f.rating).sum();
        Some(total / self.feedback.len() as f64)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_messages: self.total_messages,
            user1_messages: self.user1_activity.message_count,
            user2_messages: self.user2_activity.message_count,
            active_duration_seconds: self.active_duration_seconds,
            paused_duration_seconds: self.paused_duration_seconds,
            turn_switches: self.turn_switch_count,
            toxicity_warnings: self.toxicity_warnings,
            moderation_flags: self.moderation_flags.len(),
            prompts_used_count: self.prompts_used.len(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Pauses an active session, closing the current active segment.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Active
    pub fn pause(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), DomainError> {
        self.require_state(SessionState::Active, "pause")?;
        self.state = self.state.transition_to(SessionState::Paused)?;
        self.active_duration_seconds += now.seconds_since(&self.segment_started_at);
        self.paused_at = Some(now);
        self.pause_reason = Some(reason.into());
        Ok(())
    }

    /// Resumes a paused session and opens a new active segment.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless Paused
    pub fn resume(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.require_state(SessionState::Paused, "resume")?;
        self.state = self.state.transition_to(SessionState::Active)?;
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_duration_seconds += now.seconds_since(&paused_at);
        }
        self.pause_reason = None;
        self.segment_started_at = now;
        self.last_activity_at = now;
        Ok(())
    }

    /// Ends the session.
    ///
    /// Ending an already ended session changes nothing and reports
    /// [`EndOutcome::AlreadyTerminal`].
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if the session is live and `ended_by` is given
    ///   but not in this session
    pub fn end(
        &mut self,
        reason: EndReason,
        ended_by: Option<&UserId>,
        now: Timestamp,
    ) -> Result<EndOutcome, DomainError> {
        if self.is_terminal() {
            return Ok(EndOutcome::AlreadyTerminal);
        }
        if let Some(user) = ended_by {
            self.side_of(user)?;
        }

        match self.state {
            SessionState::Active => {
                self.active_duration_seconds += now.seconds_since(&self.segment_started_at);
            }
            SessionState::Paused => {
                if let Some(paused_at) = self.paused_at {
                    self.paused_duration_seconds += now.seconds_since(&paused_at);
                }
            }
            _ => {}
        }

        let terminal = reason.terminal_state();
        self.state = self.state.transition_to(terminal)?;
        self.paused_at = None;
        self.ended_at = Some(now);
        self.end_reason = Some(reason);
        self.ended_by = ended_by.cloned();
        self.user1_activity.typing = false;
        self.user2_activity.typing = false;
        Ok(EndOutcome::Ended(terminal))
    }

    /// Swaps the practice language. Returns the new turn.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session has ended
    pub fn switch_turn(&mut self, now: Timestamp) -> Result<TurnLanguage, DomainError> {
        self.require_live("switch turns")?;
        self.turn = self.turn.next();
        self.turn_switched_at = Some(now);
        self.turn_switch_count += 1;
        Ok(self.turn)
    }

    pub fn set_auto_turn_switch(&mut self, enabled: bool) {
        self.auto_turn_switch = enabled;
    }

    /// Notes that a switch nudge went out at `now`.
    pub fn record_turn_switch_suggestion(&mut self, now: Timestamp) {
        self.last_turn_switch_suggested_at = Some(now);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Prompts
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads a prompt pack and starts from its first prompt. Replaces any
    /// pack loaded earlier.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session has ended
    pub fn assign_prompt_pack(
        &mut self,
        pack_id: PromptPackId,
        prompts: Vec<String>,
    ) -> Result<(), DomainError> {
        self.require_live("load prompts")?;
        self.prompt_pack_id = Some(pack_id);
        self.prompts_used = prompts;
        self.current_prompt_index = 0;
        Ok(())
    }

    /// Moves to the next prompt. Returns false on the last prompt, where
    /// the index stays put.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session has ended
    pub fn advance_prompt(&mut self) -> Result<bool, DomainError> {
        self.require_live("advance prompts")?;
        if self.current_prompt_index + 1 >= self.prompts_used.len() {
            return Ok(false);
        }
        self.current_prompt_index += 1;
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Feedback
    // ─────────────────────────────────────────────────────────────────────────

    /// Records a participant's rating of the finished session.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this session
    /// - `InvalidStateTransition` while the session is live
    /// - `AlreadyResponded` if this participant already rated it
    pub fn submit_feedback(
        &mut self,
        user: &UserId,
        rating: Rating,
        comment: Option<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.side_of(user)?;
        if !self.is_terminal() {
            return Err(DomainError::state_conflict(format!(
                "Session {} is still {}; feedback opens once it ends",
                self.id, self.state
            )));
        }
        if self.feedback.iter().any(|f| &f.user_id == user) {
            return Err(DomainError::new(
                ErrorCode::AlreadyResponded,
                format!("User {} already rated session {}", user, self.id),
            ));
        }
        self.feedback.push(SessionFeedback {
            user_id: user.clone(),
            rating: rating.value(),
            comment,
            submitted_at: now,
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Activity
    // ─────────────────────────────────────────────────────────────────────────

    /// Heartbeat from a participant.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this session
    /// - `InvalidStateTransition` if the session has ended
    pub fn record_activity(&mut self, user: &UserId, now: Timestamp) -> Result<(), DomainError> {
        let side = self.side_of(user)?;
        self.require_live("record activity")?;
        self.touch(side, now);
        Ok(())
    }

    /// Counts a message sent by a participant.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this session
    /// - `InvalidStateTransition` if the session has ended
    pub fn record_message(&mut self, user: &UserId, now: Timestamp) -> Result<(), DomainError> {
        let side = self.side_of(user)?;
        self.require_live("record messages")?;
        self.activity_mut(side).message_count += 1;
        self.total_messages += 1;
        self.touch(side, now);
        Ok(())
    }

    /// Updates a participant's typing indicator. Typing counts as activity.
    ///
    /// # Errors
    ///
    /// - `NotParticipant` if `user` is not in this session
    /// - `InvalidStateTransition` if the session has ended
    pub fn set_typing(&mut self, user: &UserId, typing: bool, now: Timestamp) -> Result<(), DomainError> {
        let side = self.side_of(user)?;
        self.require_live("update typing")?;
        self.activity_mut(side).typing = typing;
        if typing {
            self.touch(side, now);
        }
        Ok(())
    }

    /// Appends a moderation flag. Toxic kinds bump the warning counter.
    pub fn add_moderation_flag(&mut self, kind: ModerationKind, details: JsonValue, now: Timestamp) {
        if kind.counts_as_toxicity_warning() {
            self.toxicity_warnings += 1;
        }
        self.moderation_flags.push(ModerationFlag {
            kind,
            details,
            flagged_at: now,
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn side_of(&self, user: &UserId) -> Result<Side, DomainError> {
        if user == &self.user1 {
            Ok(Side::User1)
        } else if user == &self.user2 {
            Ok(Side::User2)
        } else {
            Err(DomainError::new(
                ErrorCode::NotParticipant,
                format!("User {} is not part of session {}", user, self.id),
            )
            .with_detail("session_id", self.id.to_string()))
        }
    }

    fn activity_mut(&mut self, side: Side) -> &mut ParticipantActivity {
        match side {
            Side::User1 => &mut self.user1_activity,
            Side::User2 => &mut self.user2_activity,
        }
    }

    fn touch(&mut self, side: Side, now: Timestamp) {
        self.activity_mut(side).last_seen = Some(now);
        self.last_activity_at = now;
    }

    fn require_state(&self, expected: SessionState, action: &str) -> Result<(), DomainError> {
        if self.state != expected {
            return Err(DomainError::state_conflict(format!(
                "Cannot {} session {} while {}",
                action, self.id, self.state
            ))
            .with_detail("state", self.state.as_str()));
        }
        Ok(())
    }

    fn require_live(&self, action: &str) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::state_conflict(format!(
                "Cannot {} in session {}: already {}",
                action, self.id, self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::candidate::fixtures::at;
    use crate::domain::proposal::fixtures::accepted;

    /// Active session between "ana" and "ben" started at t=0.
    pub fn started() -> Session {
        Session::start(SessionId::new(), &accepted(), DEFAULT_PLANNED_MINUTES, at(0)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::started;
    use super::*;
    use crate::domain::candidate::fixtures::{at, user};
    use crate::domain::candidate::profile_fixtures::lang;
    use crate::domain::proposal::fixtures::{accepted, proposed};
    use serde_json::json;

    #[test]
    fn start_requires_accepted_match() {
        let err = Session::start(SessionId::new(), &proposed(), 25, at(0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn start_rejects_zero_length() {
        assert!(Session::start(SessionId::new(), &accepted(), 0, at(0)).is_err());
    }

    #[test]
    fn started_session_is_active_with_user1_turn() {
        let s = started();
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.turn(), TurnLanguage::User1Native);
        assert!(s.room_id().starts_with("room_"));
        assert_eq!(s.language_for_turn(), &lang("en"));
        assert_eq!(s.languages().user2_native, lang("es"));
    }

    #[test]
    fn rooms_are_unique() {
        assert_ne!(started().room_id(), started().room_id());
    }

    #[test]
    fn pause_resume_end_accrues_disjoint_durations() {
        let mut s = started();
        s.pause("disconnection", at(60)).unwrap();
        s.resume(at(120)).unwrap();
        let outcome = s.end(EndReason::Completed, None, at(180)).unwrap();

        assert_eq!(outcome, EndOutcome::Ended(SessionState::Ended));
        assert_eq!(s.active_duration_seconds(), 120);
        assert_eq!(s.paused_duration_seconds(), 60);
        assert_eq!(s.ended_at(), Some(at(180)));
    }

    #[test]
    fn repeated_pause_cycles_do_not_double_count() {
        let mut s = started();
        s.pause("a", at(100)).unwrap();
        s.resume(at(150)).unwrap();
        s.pause("b", at(250)).unwrap();
        s.resume(at(300)).unwrap();
        s.end(EndReason::Completed, None, at(400)).unwrap();

        assert_eq!(s.active_duration_seconds(), 100 + 100 + 100);
        assert_eq!(s.paused_duration_seconds(), 50 + 50);
    }

    #[test]
    fn ending_while_paused_accrues_pause_only() {
        let mut s = started();
        s.pause("disconnection", at(300)).unwrap();
        let outcome = s
            .end(EndReason::UserLeft, Some(&user("ben")), at(300 + 600))
            .unwrap();

        assert_eq!(outcome, EndOutcome::Ended(SessionState::Dropped));
        assert_eq!(s.active_duration_seconds(), 300);
        assert_eq!(s.paused_duration_seconds(), 600);
        assert_eq!(s.ended_by(), Some(&user("ben")));
        assert!(s.paused_at().is_none());
    }

    #[test]
    fn pause_requires_active() {
        let mut s = started();
        s.pause("x", at(1)).unwrap();
        assert!(s.pause("y", at(2)).is_err());
    }

    #[test]
    fn resume_requires_paused() {
        let mut s = started();
        assert!(s.resume(at(1)).is_err());
    }

    #[test]
    fn end_on_terminal_session_is_a_silent_no_op() {
        let mut s = started();
        s.end(EndReason::Completed, None, at(100)).unwrap();
        let before = s.clone();

        let outcome = s.end(EndReason::Inactivity, None, at(5000)).unwrap();
        assert_eq!(outcome, EndOutcome::AlreadyTerminal);
        assert_eq!(s, before);
    }

    #[test]
    fn end_by_outsider_is_rejected() {
        let mut s = started();
        let err = s
            .end(EndReason::UserLeft, Some(&user("eve")), at(10))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotParticipant);
        assert_eq!(s.state(), SessionState::Active);
    }

    #[test]
    fn maximum_duration_expires_session() {
        let mut s = started();
        let outcome = s.end(EndReason::MaximumDuration, None, at(7200)).unwrap();
        assert_eq!(outcome, EndOutcome::Ended(SessionState::Expired));
    }

    #[test]
    fn end_clears_typing() {
        let mut s = started();
        s.set_typing(&user("ana"), true, at(5)).unwrap();
        s.end(EndReason::Completed, None, at(10)).unwrap();
        assert!(!s.activity_of(&user("ana")).unwrap().typing);
    }

    #[test]
    fn switch_turn_cycles() {
        let mut s = started();
        assert_eq!(s.switch_turn(at(1)).unwrap(), TurnLanguage::User2Native);
        assert_eq!(s.language_for_turn(), &lang("es"));
        assert_eq!(s.switch_turn(at(2)).unwrap(), TurnLanguage::User1Native);
        assert_eq!(s.turn_switch_count(), 2);
        assert_eq!(s.turn_switched_at(), Some(at(2)));
    }

    #[test]
    fn switch_turn_from_mixed_yields_user1() {
        let mut s = started();
        s.turn = TurnLanguage::Mixed;
        assert_eq!(s.language_for_turn(), &lang("en"));
        assert_eq!(s.switch_turn(at(1)).unwrap(), TurnLanguage::User1Native);
        assert_eq!(s.switch_turn(at(2)).unwrap(), TurnLanguage::User2Native);
        assert_eq!(s.switch_turn(at(3)).unwrap(), TurnLanguage::User1Native);
    }

    #[test]
    fn switch_turn_on_ended_session_fails() {
        let mut s = started();
        s.end(EndReason::Completed, None, at(10)).unwrap();
        let err = s.switch_turn(at(11)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn turn_switch_suggestion_needs_a_prior_switch() {
        let interval = Duration::minutes(10);
        let mut s = started();
        assert!(!s.should_suggest_turn_switch(interval, at(3600)));

        s.switch_turn(at(0)).unwrap();
        assert!(!s.should_suggest_turn_switch(interval, at(600)));
        assert!(s.should_suggest_turn_switch(interval, at(601)));

        s.set_auto_turn_switch(false);
        assert!(!s.should_suggest_turn_switch(interval, at(601)));
    }

    #[test]
    fn overdue_and_remaining_time() {
        let s = started();
        assert!(!s.is_overdue(at(25 * 60)));
        assert!(s.is_overdue(at(25 * 60 + 1)));
        assert_eq!(s.time_remaining(at(20 * 60)), Duration::minutes(5));
        assert_eq!(s.time_remaining(at(30 * 60)), Duration::zero());
    }

    #[test]
    fn queries_are_false_on_terminal_sessions() {
        let mut s = started();
        s.end(EndReason::Completed, None, at(10)).unwrap();
        let late = at(10 * 3600);
        assert!(!s.is_overdue(late));
        assert!(!s.is_idle(Duration::minutes(15), late));
        assert!(!s.exceeds_max_duration(Duration::hours(2), late));
        assert_eq!(s.time_remaining(late), Duration::zero());
    }

    #[test]
    fn idle_detection_follows_last_activity() {
        let mut s = started();
        let timeout = Duration::minutes(15);
        assert!(s.is_idle(timeout, at(15 * 60 + 1)));

        s.record_activity(&user("ana"), at(600)).unwrap();
        assert!(!s.is_idle(timeout, at(15 * 60 + 1)));
        assert!(s.is_idle(timeout, at(600 + 15 * 60 + 1)));
    }

    #[test]
    fn messages_count_per_participant() {
        let mut s = started();
        s.record_message(&user("ana"), at(1)).unwrap();
        s.record_message(&user("ana"), at(2)).unwrap();
        s.record_message(&user("ben"), at(3)).unwrap();

        let stats = s.stats();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.user1_messages, 2);
        assert_eq!(stats.user2_messages, 1);
        assert_eq!(s.last_activity_at(), at(3));
        assert_eq!(s.activity_of(&user("ben")).unwrap().last_seen, Some(at(3)));
    }

    #[test]
    fn outsiders_cannot_post() {
        let mut s = started();
        let err = s.record_message(&user("eve"), at(1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotParticipant);
    }

    #[test]
    fn stopping_typing_is_not_activity() {
        let mut s = started();
        s.set_typing(&user("ben"), false, at(500)).unwrap();
        assert_eq!(s.last_activity_at(), at(0));
    }

    #[test]
    fn moderation_flags_count_toxic_kinds_only() {
        let mut s = started();
        s.add_moderation_flag(ModerationKind::Toxicity, json!({"score": 0.9}), at(1));
        s.add_moderation_flag(ModerationKind::PiiDetected, json!({}), at(2));
        s.add_moderation_flag(ModerationKind::InappropriateContent, json!({}), at(3));

        assert_eq!(s.toxicity_warnings(), 2);
        assert_eq!(s.moderation_flags().len(), 3);
        assert_eq!(s.moderation_flags()[0].details["score"], 0.9);
        assert_eq!(s.state(), SessionState::Active);
    }

    #[test]
    fn partner_lookup() {
        let s = started();
        assert_eq!(s.partner_of(&user("ana")).unwrap(), &user("ben"));
        assert!(s.partner_of(&user("eve")).is_err());
        assert!(s.is_participant(&user("ben")));
    }

    #[test]
    fn ending_an_ended_session_skips_the_participant_check() {
        let mut s = started();
        s.end(EndReason::Completed, Some(&user("ana")), at(100)).unwrap();
        let before = s.clone();

        let outcome = s
            .end(EndReason::UserLeft, Some(&user("eve")), at(200))
            .unwrap();
        assert_eq!(outcome, EndOutcome::AlreadyTerminal);
        assert_eq!(s, before);
    }

    #[test]
    fn one_turn_switch_nudge_per_interval() {
        let interval = Duration::minutes(10);
        let mut s = started();
        s.switch_turn(at(0)).unwrap();

        assert!(s.should_suggest_turn_switch(interval, at(601)));
        s.record_turn_switch_suggestion(at(601));
        assert_eq!(s.last_turn_switch_suggested_at(), Some(at(601)));
        assert!(!s.should_suggest_turn_switch(interval, at(660)));
        assert!(!s.should_suggest_turn_switch(interval, at(1201)));
        assert!(s.should_suggest_turn_switch(interval, at(1202)));

        // a real switch after the nudge restarts the count from the switch
        s.switch_turn(at(1000)).unwrap();
        assert!(!s.should_suggest_turn_switch(interval, at(1202)));
        assert!(s.should_suggest_turn_switch(interval, at(1601)));
    }

    #[test]
    fn prompt_pack_walks_forward_and_stops_at_the_end() {
        let mut s = started();
        assert_eq!(s.current_prompt(), None);
        assert!(!s.advance_prompt().unwrap());

        let pack = PromptPackId::new();
        s.assign_prompt_pack(pack, vec!["Favourite dish?".into(), "Last trip?".into()])
            .unwrap();
        assert_eq!(s.prompt_pack_id(), Some(pack));
        assert_eq!(s.current_prompt(), Some("Favourite dish?"));

        assert!(s.advance_prompt().unwrap());
        assert_eq!(s.current_prompt(), Some("Last trip?"));
        assert!(!s.advance_prompt().unwrap());
        assert_eq!(s.current_prompt_index(), 1);
        assert_eq!(s.stats().prompts_used_count, 2);
    }

    #[test]
    fn prompts_are_frozen_once_ended() {
        let mut s = started();
        s.assign_prompt_pack(PromptPackId::new(), vec!["a".into(), "b".into()])
            .unwrap();
        s.end(EndReason::Completed, None, at(10)).unwrap();

        assert!(s.advance_prompt().is_err());
        assert!(s.assign_prompt_pack(PromptPackId::new(), vec![]).is_err());
        assert_eq!(s.current_prompt(), Some("a"));
    }

    #[test]
    fn feedback_opens_after_the_end_and_averages_both_sides() {
        let rating = |v| Rating::new(v).unwrap();
        let mut s = started();
        let err = s
            .submit_feedback(&user("ana"), rating(5.0), None, at(5))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);

        s.end(EndReason::Completed, None, at(600)).unwrap();
        assert_eq!(s.average_quality(), None);

        s.submit_feedback(&user("ana"), rating(5.0), Some("great".into()), at(610))
            .unwrap();
        assert_eq!(s.average_quality(), Some(5.0));
        s.submit_feedback(&user("ben"), rating(3.0), None, at(620))
            .unwrap();
        assert_eq!(s.average_quality(), Some(4.0));
        assert_eq!(s.feedback()[0].comment.as_deref(), Some("great"));

        let again = s
            .submit_feedback(&user("ben"), rating(1.0), None, at(630))
            .unwrap_err();
        assert_eq!(again.code, ErrorCode::AlreadyResponded);
        let outsider = s
            .submit_feedback(&user("eve"), rating(1.0), None, at(630))
            .unwrap_err();
        assert_eq!(outsider.code, ErrorCode::NotParticipant);
        assert_eq!(s.feedback().len(), 2);
    }
}
