//! Matchmaking domain module.
//!
//! Pure pairing decisions over a candidate snapshot. The application layer
//! commits the resulting plan under per-candidate compare-and-set.

mod planner;

pub use planner::{plan_pairings, PairingPolicy, ProposedPairing, DEFAULT_MINIMUM_SCORE};
