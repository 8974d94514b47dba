//! Session lifecycle state, turn language and end reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle state of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Active,
    Paused,
    /// Completed normally.
    Ended,
    /// Terminated abnormally (left, idle, error, moderation).
    Dropped,
    /// Hit the maximum session duration.
    Expired,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Paused => "paused",
            SessionState::Ended => "ended",
            SessionState::Dropped => "dropped",
            SessionState::Expired => "expired",
        }
    }

    /// Active or Paused.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Active | SessionState::Paused)
    }
}

impl StateMachine for SessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionState::*;
        match self {
            Active => vec![Paused, Ended, Dropped, Expired],
            Paused => vec![Active, Ended, Dropped, Expired],
            Ended | Dropped | Expired => vec![],
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whose native language is the practice language right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnLanguage {
    #[default]
    User1Native,
    User2Native,
    /// Free conversation.
    Mixed,
}

impl TurnLanguage {
    /// The turn after a switch. Mixed collapses to User1Native.
    pub fn next(&self) -> TurnLanguage {
        match self {
            TurnLanguage::User1Native => TurnLanguage::User2Native,
            TurnLanguage::User2Native | TurnLanguage::Mixed => TurnLanguage::User1Native,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    UserLeft,
    Inactivity,
    TechnicalError,
    Moderation,
    MaximumDuration,
}

impl EndReason {
    /// Terminal state a session ends in for this reason.
    pub fn terminal_state(&self) -> SessionState {
        match self {
            EndReason::Completed => SessionState::Ended,
            EndReason::MaximumDuration => SessionState::Expired,
            EndReason::UserLeft
            | EndReason::Inactivity
            | EndReason::TechnicalError
            | EndReason::Moderation => SessionState::Dropped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Completed => "completed",
            EndReason::UserLeft => "user_left",
            EndReason::Inactivity => "inactivity",
            EndReason::TechnicalError => "technical_error",
            EndReason::Moderation => "moderation",
            EndReason::MaximumDuration => "maximum_duration",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of asking a session to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// This call ended the session in the given terminal state.
    Ended(SessionState),
    /// The session had already ended; nothing changed.
    AlreadyTerminal,
}

impl EndOutcome {
    pub fn ended_now(&self) -> bool {
        matches!(self, EndOutcome::Ended(_))
    }
}
