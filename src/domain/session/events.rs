//! Session domain events.
//!
//! - `SessionStarted` - An accepted match produced a live session
//! - `SessionPaused` / `SessionResumed` - Pause lifecycle
//! - `SessionEnded` - The session reached a terminal state
//! - `TurnSwitched` - Practice language changed
//! - `TurnSwitchSuggested` - Participants should swap languages
//! - `SessionFlagged` - A moderation flag was recorded
//! - `PromptAdvanced` - The conversation moved to the next prompt
//! - `SessionFeedbackSubmitted` - A participant rated the finished session

use serde::{Deserialize, Serialize};

use super::{EndReason, ModerationKind, Session, SessionState, SessionStats, TurnLanguage};
use crate::domain::candidate::LanguageCode;
use crate::domain::foundation::{domain_event, EventId, MatchId, SessionId, Timestamp, UserId};

// ════════════════════════════════════════════════════════════════════════════
// SessionStarted
// ════════════════════════════════════════════════════════════════════════════

/// Published when a session starts. Carries the room both users join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub match_id: MatchId,
    pub user1: UserId,
    pub user2: UserId,
    pub room_id: String,
    pub planned_duration_minutes: u32,
    pub started_at: Timestamp,
}

domain_event!(
    SessionStarted,
    event_type = "session.started.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = started_at,
    event_id = event_id
);

impl SessionStarted {
    pub fn from_session(s: &Session) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            match_id: s.match_id(),
            user1: s.user1().clone(),
            user2: s.user2().clone(),
            room_id: s.room_id().to_string(),
            planned_duration_minutes: s.planned_duration_minutes(),
            started_at: s.started_at(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionPaused / SessionResumed
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPaused {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub reason: String,
    pub paused_at: Timestamp,
}

domain_event!(
    SessionPaused,
    event_type = "session.paused.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = paused_at,
    event_id = event_id
);

impl SessionPaused {
    pub fn from_session(s: &Session, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            reason: s.pause_reason().unwrap_or_default().to_string(),
            paused_at: s.paused_at().unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResumed {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub paused_duration_seconds: i64,
    pub resumed_at: Timestamp,
}

domain_event!(
    SessionResumed,
    event_type = "session.resumed.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = resumed_at,
    event_id = event_id
);

impl SessionResumed {
    pub fn from_session(s: &Session, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            paused_duration_seconds: s.paused_duration_seconds(),
            resumed_at: now,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionEnded
// ════════════════════════════════════════════════════════════════════════════

/// Published once, when a session first reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnded {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub match_id: MatchId,
    pub state: SessionState,
    pub reason: Option<EndReason>,
    pub ended_by: Option<UserId>,
    pub stats: SessionStats,
    pub ended_at: Timestamp,
}

domain_event!(
    SessionEnded,
    event_type = "session.ended.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = ended_at,
    event_id = event_id
);

impl SessionEnded {
    pub fn from_session(s: &Session, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            match_id: s.match_id(),
            state: s.state(),
            reason: s.end_reason(),
            ended_by: s.ended_by().cloned(),
            stats: s.stats(),
            ended_at: s.ended_at().unwrap_or(now),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Turn events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSwitched {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub turn: TurnLanguage,
    pub language: LanguageCode,
    pub switch_count: u32,
    pub switched_at: Timestamp,
}

domain_event!(
    TurnSwitched,
    event_type = "session.turn_switched.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = switched_at,
    event_id = event_id
);

impl TurnSwitched {
    pub fn from_session(s: &Session, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            turn: s.turn(),
            language: s.language_for_turn().clone(),
            switch_count: s.turn_switch_count(),
            switched_at: s.turn_switched_at().unwrap_or(now),
        }
    }
}

/// Nudge to swap languages. Carries the turn that would come next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSwitchSuggested {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub current_turn: TurnLanguage,
    pub suggested_turn: TurnLanguage,
    pub suggested_at: Timestamp,
}

domain_event!(
    TurnSwitchSuggested,
    event_type = "session.turn_switch_suggested.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = suggested_at,
    event_id = event_id
);

impl TurnSwitchSuggested {
    pub fn from_session(s: &Session, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            current_turn: s.turn(),
            suggested_turn: s.turn().next(),
            suggested_at: now,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionFlagged
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFlagged {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub kind: ModerationKind,
    pub toxicity_warnings: u32,
    pub flagged_at: Timestamp,
}

domain_event!(
    SessionFlagged,
    event_type = "session.flagged.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = flagged_at,
    event_id = event_id
);

impl SessionFlagged {
    pub fn new(s: &Session, kind: ModerationKind, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            kind,
            toxicity_warnings: s.toxicity_warnings(),
            flagged_at: now,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Prompts and feedback
// ════════════════════════════════════════════════════════════════════════════

/// The participants moved on to another conversation prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptAdvanced {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub prompt_index: usize,
    pub prompt: Option<String>,
    pub advanced_at: Timestamp,
}

domain_event!(
    PromptAdvanced,
    event_type = "session.prompt_advanced.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = advanced_at,
    event_id = event_id
);

impl PromptAdvanced {
    pub fn from_session(s: &Session, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            prompt_index: s.current_prompt_index(),
            prompt: s.current_prompt().map(str::to_string),
            advanced_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFeedbackSubmitted {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub rating: f64,
    pub average_quality: Option<f64>,
    pub submitted_at: Timestamp,
}

domain_event!(
    SessionFeedbackSubmitted,
    event_type = "session.feedback_submitted.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "Session",
    occurred_at = submitted_at,
    event_id = event_id
);

impl SessionFeedbackSubmitted {
    pub fn new(s: &Session, user_id: &UserId, rating: f64, now: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: s.id(),
            user_id: user_id.clone(),
            rating,
            average_quality: s.average_quality(),
            submitted_at: now,
        }
    }
}
