//! Time-driven transitions.

mod run_sweep;

pub use run_sweep::{RunSweepHandler, SweepReport};
