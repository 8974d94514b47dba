//! Compatibility scoring.
//!
//! `compatibility` turns named factors into a score in [0, 1]; `factors`
//! derives those factors (and the hard pairing constraints) from two
//! candidates. Everything here is pure.

mod compatibility;
mod factors;

pub use compatibility::{score, Factor, MatchingFactors};
pub use factors::{
    derive_factors, interest_overlap, is_compatible, language_pair, level_affinity,
    level_difference, native_target_match, quality_score, timezone_overlap, LanguagePair,
};
