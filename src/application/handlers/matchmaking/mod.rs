//! Matchmaking pass handler.

mod run_matchmaking_pass;

pub use run_matchmaking_pass::{MatchmakingPassReport, RunMatchmakingPassHandler};
