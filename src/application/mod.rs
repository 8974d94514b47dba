//! Application layer - Commands and their handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers are grouped by the part of the system they drive: the candidate
//! registry, the matchmaking pass, the proposal protocol, live sessions and
//! the periodic sweep.

mod error;
pub mod handlers;

pub use error::MatchmakingError;
pub use handlers::*;
