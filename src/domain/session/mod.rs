//! Conversation session domain module.
//!
//! A session is started from an accepted match and lives until it ends,
//! is dropped, or hits the duration cap.
//!
//! # Events
//!
//! - `SessionStarted`, `SessionPaused`, `SessionResumed`, `SessionEnded`
//! - `TurnSwitched`, `TurnSwitchSuggested`
//! - `SessionFlagged`
//! - `PromptAdvanced`, `SessionFeedbackSubmitted`

mod aggregate;
mod events;
mod moderation;
mod state;

pub use aggregate::{
    ParticipantActivity, Session, SessionFeedback, SessionLanguages, SessionStats,
    DEFAULT_PLANNED_MINUTES,
};
pub use events::{
    PromptAdvanced, SessionEnded, SessionFeedbackSubmitted, SessionFlagged, SessionPaused,
    SessionResumed, SessionStarted, TurnSwitchSuggested, TurnSwitched,
};
pub use moderation::{ContentAssessment, ModerationFlag, ModerationKind, ModerationPolicy};
pub use state::{EndOutcome, EndReason, SessionState, TurnLanguage};

#[cfg(test)]
pub(crate) use aggregate::fixtures;
