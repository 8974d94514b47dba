//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and event plumbing
//! that form the vocabulary of the matchmaking domain.

mod command;
mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;
mod version;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCategory, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{HistoryRecordId, MatchId, PromptPackId, SessionId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
pub use version::Version;
