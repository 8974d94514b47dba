//! Candidate registry handlers.

mod block_user;
mod dequeue_candidate;
mod enqueue_candidate;
mod record_rating;
mod record_strike;
mod register_candidate;

pub use block_user::{BlockUserCommand, BlockUserHandler, UnblockUserCommand};
pub use dequeue_candidate::{DequeueCandidateCommand, DequeueCandidateHandler};
pub use enqueue_candidate::{EnqueueCandidateCommand, EnqueueCandidateHandler};
pub use record_rating::{RecordRatingCommand, RecordRatingHandler};
pub use record_strike::{RecordStrikeCommand, RecordStrikeHandler, RecordStrikeResult};
pub use register_candidate::{RegisterCandidateCommand, RegisterCandidateHandler};
