//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `CandidateRepository` - Candidate records with versioned CAS updates
//! - `MatchRepository` - Matches, one active match per user pair
//! - `SessionRepository` - Sessions, one per match
//! - `HistoryRepository` - Append-only history snapshots
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events
//!
//! ## Time
//!
//! - `Clock` - Source of `now` for handlers

mod candidate_repository;
mod clock;
mod event_publisher;
mod event_subscriber;
mod history_repository;
mod match_repository;
mod session_repository;

pub use candidate_repository::CandidateRepository;
pub use clock::Clock;
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use history_repository::HistoryRepository;
pub use match_repository::MatchRepository;
pub use session_repository::SessionRepository;
