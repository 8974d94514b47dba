//! Match and session history.
//!
//! One record is written when a match reaches a terminal state and one
//! when its session does. Records are never updated.

mod events;
mod record;

pub use events::HistoryRecorded;
pub use record::{HistoryKind, HistoryRecord};
