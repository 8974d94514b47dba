//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `clock` - Wall clock and a manually advanced test clock
//! - `events` - In-process event bus
//! - `memory` - In-memory repositories
//! - `postgres` - PostgreSQL repositories
//! - `scheduler` - Periodic matchmaking pass and sweep

pub mod clock;
pub mod events;
pub mod memory;
pub mod postgres;
pub mod scheduler;

pub use clock::{ManualClock, SystemClock};
pub use events::InMemoryEventBus;
pub use memory::{
    InMemoryCandidateRepository, InMemoryHistoryRepository, InMemoryMatchRepository,
    InMemorySessionRepository,
};
pub use scheduler::SweepScheduler;
