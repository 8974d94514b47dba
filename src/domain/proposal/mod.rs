//! Proposal protocol domain module.
//!
//! A `Match` is created in `Proposed`, resolved by both users' answers or
//! by expiry, and finally linked to the session it produced.
//!
//! # Events
//!
//! - `MatchProposed` - Published when a match is proposed
//! - `MatchResolved` - Published when both users have answered
//! - `MatchExpired` - Published when the answer window closes
//! - `MatchFailed` - Published when an accepted match never got a session

mod aggregate;
mod events;
mod state;

#[cfg(test)]
mod proptests;

pub use aggregate::{Match, Side, SideResponse, DEFAULT_PROPOSAL_TTL_SECS, SESSION_SETUP_FAILED};
pub use events::{MatchExpired, MatchFailed, MatchProposed, MatchResolved};
pub use state::{Decision, MatchState, RejectionReason, Response};

#[cfg(test)]
pub(crate) use aggregate::fixtures;
