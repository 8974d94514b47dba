//! Proposal protocol handlers.

mod respond_to_match;

pub use respond_to_match::{RespondToMatchCommand, RespondToMatchHandler, RespondToMatchResult};
