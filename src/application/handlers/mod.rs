//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over the ports.
//! Every handler takes its collaborators as `Arc<dyn Port>` and each
//! command carries a `CommandMetadata` that is stamped onto the events it
//! publishes.

pub mod candidate;
pub mod matchmaking;
pub mod proposal;
pub mod session;
pub mod sweep;

mod settlement;

#[cfg(test)]
pub(crate) mod test_support;

pub use candidate::{
    BlockUserCommand, BlockUserHandler, DequeueCandidateCommand, DequeueCandidateHandler,
    EnqueueCandidateCommand, EnqueueCandidateHandler, RecordRatingCommand, RecordRatingHandler,
    RecordStrikeCommand, RecordStrikeHandler, RecordStrikeResult, RegisterCandidateCommand,
    RegisterCandidateHandler, UnblockUserCommand,
};
pub use matchmaking::{MatchmakingPassReport, RunMatchmakingPassHandler};
pub use proposal::{RespondToMatchCommand, RespondToMatchHandler, RespondToMatchResult};
pub use session::{
    AdvancePromptCommand, AdvancePromptResult, AssignPromptPackCommand, ContentFlag,
    EndSessionCommand, EndSessionHandler, EndSessionResult, FlagSessionContentCommand,
    FlagSessionContentHandler, FlagSessionContentResult, PauseSessionCommand,
    PauseSessionHandler, PromptPackHandler, RecordSessionActivityCommand,
    RecordSessionActivityHandler, ResumeSessionCommand, ResumeSessionHandler,
    SessionActivity, SetAutoTurnSwitchCommand, SubmitSessionFeedbackCommand,
    SubmitSessionFeedbackHandler, SwitchTurnCommand, SwitchTurnHandler, SwitchTurnResult,
};
pub use sweep::{RunSweepHandler, SweepReport};
