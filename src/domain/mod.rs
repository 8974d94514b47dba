//! Domain layer containing matchmaking rules and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `candidate` - Candidate registry: queue, cooldowns, ratings, blocks
//! - `scoring` - Compatibility factors and the weighted score
//! - `matchmaking` - Pure pairing planner over queued candidates
//! - `proposal` - Match proposal protocol
//! - `session` - Conversation session lifecycle
//! - `history` - Write-once snapshots of finished matches and sessions
//!
//! Every operation that depends on time takes `now` explicitly.

pub mod candidate;
pub mod foundation;
pub mod history;
pub mod matchmaking;
pub mod proposal;
pub mod scoring;
pub mod session;
