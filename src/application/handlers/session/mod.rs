//! Session lifecycle handlers.
//!
//! All of them load the session, apply one aggregate operation, store it
//! with a compare-and-set update and publish the matching event.

mod end_session;
mod flag_session_content;
mod pause_session;
mod prompt_pack;
mod record_session_activity;
mod resume_session;
mod submit_feedback;
mod switch_turn;

pub use end_session::{EndSessionCommand, EndSessionHandler, EndSessionResult};
pub use flag_session_content::{
    ContentFlag, FlagSessionContentCommand, FlagSessionContentHandler, FlagSessionContentResult,
};
pub use pause_session::{PauseSessionCommand, PauseSessionHandler};
pub use prompt_pack::{
    AdvancePromptCommand, AdvancePromptResult, AssignPromptPackCommand, PromptPackHandler,
};
pub use record_session_activity::{
    RecordSessionActivityCommand, RecordSessionActivityHandler, SessionActivity,
};
pub use resume_session::{ResumeSessionCommand, ResumeSessionHandler};
pub use submit_feedback::{SubmitSessionFeedbackCommand, SubmitSessionFeedbackHandler};
pub use switch_turn::{
    SetAutoTurnSwitchCommand, SwitchTurnCommand, SwitchTurnHandler, SwitchTurnResult,
};

use crate::application::MatchmakingError;
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::session::Session;
use crate::ports::SessionRepository;

async fn load_session(
    sessions: &dyn SessionRepository,
    id: &SessionId,
) -> Result<Session, MatchmakingError> {
    sessions
        .find_by_id(id)
        .await?
        .ok_or_else(|| MatchmakingError::session_not_found(id))
}

/// Loads a session on behalf of one of its participants.
async fn load_for_participant(
    sessions: &dyn SessionRepository,
    id: &SessionId,
    user: &UserId,
) -> Result<Session, MatchmakingError> {
    let session = load_session(sessions, id).await?;
    session.activity_of(user)?;
    Ok(session)
}
