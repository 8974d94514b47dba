//! Candidate registry domain module.
//!
//! Tracks each user's matchmaking eligibility: queue membership, cooldowns,
//! strikes, blocks, ratings and the match currently holding them.
//!
//! # Events
//!
//! - `CandidateQueued` - Published when a candidate joins the queue

mod aggregate;
mod events;
mod profile;
mod rating;
mod status;

#[cfg(test)]
mod proptests;

pub use aggregate::{
    Candidate, QueueEntry, REJECTION_COOLDOWN_REASON, STRIKE_COOLDOWN_HOURS,
    STRIKE_COOLDOWN_REASON, STRIKE_LIMIT,
};
pub use events::CandidateQueued;
pub use profile::{
    CefrLevel, LanguageCode, MatchingPreferences, MatchingProfile, TargetLanguage,
    DEFAULT_MAX_LEVEL_DIFFERENCE,
};
pub use rating::{Rating, RatingAccumulator, DEFAULT_AVERAGE_RATING};
pub use status::CandidateStatus;

#[cfg(test)]
pub(crate) use aggregate::fixtures;
#[cfg(test)]
pub(crate) use profile::fixtures as profile_fixtures;
