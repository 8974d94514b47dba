//! Derivation of matching factors and hard pairing constraints.
//!
//! All functions here are pure and symmetric in their inputs except for
//! [`language_pair`], which is oriented user1 → user2.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Factor, MatchingFactors};
use crate::domain::candidate::{Candidate, LanguageCode, MatchingProfile};

/// Steps on the CEFR scale from A1 to C2.
const CEFR_SPAN: f64 = 5.0;

/// Offset difference at which timezone overlap reaches zero.
const TIMEZONE_SPAN_HOURS: f64 = 12.0;

/// The two languages exchanged in a pairing.
///
/// `primary` is user1's native language, practised by user2; `secondary`
/// is user2's native language, practised by user1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub primary: LanguageCode,
    pub secondary: LanguageCode,
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<->{}", self.primary, self.secondary)
    }
}

/// Languages user1 and user2 would exchange, or `None` when the exchange
/// is not bidirectional.
pub fn language_pair(user1: &MatchingProfile, user2: &MatchingProfile) -> Option<LanguagePair> {
    let primary = user2.learnable_from(user1)?.language.clone();
    let secondary = user1.learnable_from(user2)?.language.clone();
    Some(LanguagePair { primary, secondary })
}

/// CEFR distance between the two learners in the languages they exchange.
pub fn level_difference(user1: &MatchingProfile, user2: &MatchingProfile) -> Option<u8> {
    let pair = language_pair(user1, user2)?;
    let user1_level = user1.level_in(&pair.secondary)?;
    let user2_level = user2.level_in(&pair.primary)?;
    Some(user1_level.distance(&user2_level))
}

/// 1.0 for a two-way exchange, 0.5 for one-way, 0.0 for none.
pub fn native_target_match(a: &MatchingProfile, b: &MatchingProfile) -> f64 {
    let a_learns = a.learnable_from(b).is_some();
    let b_learns = b.learnable_from(a).is_some();
    match (a_learns, b_learns) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}

/// Closeness of proficiency, 1.0 at equal levels down to 0.0 at A1 vs C2.
pub fn level_affinity(a: &MatchingProfile, b: &MatchingProfile) -> f64 {
    match level_difference(a, b) {
        Some(diff) => (1.0 - f64::from(diff) / CEFR_SPAN).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Jaccard index of interest tags; 0 when both are empty.
pub fn interest_overlap(a: &MatchingProfile, b: &MatchingProfile) -> f64 {
    let union = a.interests().union(b.interests()).count();
    if union == 0 {
        return 0.0;
    }
    let shared = a.interests().intersection(b.interests()).count();
    shared as f64 / union as f64
}

/// 1.0 in the same timezone, falling to 0.0 at 12 hours apart.
pub fn timezone_overlap(a: &MatchingProfile, b: &MatchingProfile) -> f64 {
    let diff_hours =
        f64::from((a.utc_offset_minutes() - b.utc_offset_minutes()).abs()) / 60.0;
    (1.0 - diff_hours / TIMEZONE_SPAN_HOURS).clamp(0.0, 1.0)
}

/// Mean normalized partner rating of both candidates.
pub fn quality_score(a: &Candidate, b: &Candidate) -> f64 {
    let normalize = |avg: f64| ((avg - 1.0) / 4.0).clamp(0.0, 1.0);
    (normalize(a.average_rating()) + normalize(b.average_rating())) / 2.0
}

/// Computes every known factor for a pair of candidates.
pub fn derive_factors(a: &Candidate, b: &Candidate) -> MatchingFactors {
    let (pa, pb) = (a.profile(), b.profile());
    MatchingFactors::new()
        .with(Factor::LevelAffinity, level_affinity(pa, pb))
        .with(Factor::NativeTargetMatch, native_target_match(pa, pb))
        .with(Factor::InterestOverlap, interest_overlap(pa, pb))
        .with(Factor::TimezoneOverlap, timezone_overlap(pa, pb))
        .with(Factor::QualityScore, quality_score(a, b))
}

/// Hard constraints that rule a pairing out regardless of score.
pub fn is_compatible(a: &Candidate, b: &Candidate) -> bool {
    let (pa, pb) = (a.profile(), b.profile());

    let Some(diff) = level_difference(pa, pb) else {
        return false;
    };
    let max_diff = a
        .preferences()
        .max_level_difference
        .min(b.preferences().max_level_difference);
    if diff > max_diff {
        return false;
    }

    let wants_same_zone =
        a.preferences().same_timezone_only || b.preferences().same_timezone_only;
    !(wants_same_zone && pa.utc_offset_minutes() != pb.utc_offset_minutes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::fixtures::*;
    use crate::domain::candidate::profile_fixtures::{lang, profile};
    use crate::domain::candidate::{CefrLevel, MatchingPreferences, Rating, TargetLanguage};

    fn with_profile(id: &str, p: MatchingProfile) -> Candidate {
        Candidate::new(user(id), p, at(0))
    }

    #[test]
    fn language_pair_is_oriented_user1_to_user2() {
        let en = profile("en", "es", CefrLevel::B1);
        let es = profile("es", "en", CefrLevel::B2);

        let pair = language_pair(&en, &es).unwrap();
        assert_eq!(pair.primary, lang("en"));
        assert_eq!(pair.secondary, lang("es"));

        let reversed = language_pair(&es, &en).unwrap();
        assert_eq!(reversed.primary, lang("es"));
    }

    #[test]
    fn one_way_exchange_has_no_pair() {
        let en = profile("en", "es", CefrLevel::B1);
        let fr = profile("fr", "en", CefrLevel::B1);
        assert!(language_pair(&en, &fr).is_none());
        assert_eq!(native_target_match(&en, &fr), 0.5);
    }

    #[test]
    fn native_target_match_levels() {
        let en = profile("en", "es", CefrLevel::B1);
        let es = profile("es", "en", CefrLevel::B1);
        let de = profile("de", "fr", CefrLevel::B1);
        assert_eq!(native_target_match(&en, &es), 1.0);
        assert_eq!(native_target_match(&en, &de), 0.0);
    }

    #[test]
    fn level_affinity_scales_with_distance() {
        let en = profile("en", "es", CefrLevel::A1);
        let es_same = profile("es", "en", CefrLevel::A1);
        let es_far = profile("es", "en", CefrLevel::C2);

        assert_eq!(level_affinity(&en, &es_same), 1.0);
        assert_eq!(level_affinity(&en, &es_far), 0.0);
        assert_eq!(level_difference(&en, &es_far), Some(5));
    }

    #[test]
    fn interest_overlap_is_jaccard() {
        let a = MatchingProfile::new(
            vec![lang("en")],
            vec![TargetLanguage::new(lang("es"), CefrLevel::B1)],
            ["music", "film", "chess"],
            0,
        )
        .unwrap();
        let b = MatchingProfile::new(
            vec![lang("es")],
            vec![TargetLanguage::new(lang("en"), CefrLevel::B1)],
            ["music", "chess", "food", "art"],
            0,
        )
        .unwrap();
        // 2 shared / 5 total
        assert!((interest_overlap(&a, &b) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn interest_overlap_of_empty_sets_is_zero() {
        let a = MatchingProfile::new(
            vec![lang("en")],
            vec![TargetLanguage::new(lang("es"), CefrLevel::B1)],
            Vec::<String>::new(),
            0,
        )
        .unwrap();
        assert_eq!(interest_overlap(&a, &a.clone()), 0.0);
    }

    #[test]
    fn timezone_overlap_falls_off_over_twelve_hours() {
        let mk = |offset| {
            MatchingProfile::new(
                vec![lang("en")],
                vec![TargetLanguage::new(lang("es"), CefrLevel::B1)],
                Vec::<String>::new(),
                offset,
            )
            .unwrap()
        };
        assert_eq!(timezone_overlap(&mk(0), &mk(0)), 1.0);
        assert!((timezone_overlap(&mk(0), &mk(6 * 60)) - 0.5).abs() < 1e-12);
        assert_eq!(timezone_overlap(&mk(-12 * 60), &mk(14 * 60)), 0.0);
    }

    #[test]
    fn quality_score_uses_both_averages() {
        let mut a = english_learner("ana");
        let b = spanish_learner("ben");
        assert_eq!(quality_score(&a, &b), 1.0);

        a.record_rating(Rating::new(1.0).unwrap(), at(0));
        assert!((quality_score(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn derive_factors_covers_every_factor() {
        let factors = derive_factors(&english_learner("ana"), &spanish_learner("ben"));
        for f in Factor::ALL {
            assert!(factors.get(f).is_some(), "missing {f}");
        }
        assert_eq!(factors.get(Factor::NativeTargetMatch), Some(1.0));
    }

    #[test]
    fn compatible_pair_passes_constraints() {
        assert!(is_compatible(&english_learner("ana"), &spanish_learner("ben")));
    }

    #[test]
    fn same_native_language_is_incompatible() {
        assert!(!is_compatible(
            &english_learner("ana"),
            &english_learner("ben")
        ));
    }

    #[test]
    fn level_gap_beyond_either_preference_is_incompatible() {
        let a = with_profile("ana", profile("en", "es", CefrLevel::A1));
        let b = with_profile("ben", profile("es", "en", CefrLevel::B2));
        assert!(!is_compatible(&a, &b));

        let relaxed = MatchingPreferences {
            max_level_difference: 3,
            ..Default::default()
        };
        let a = a.with_preferences(relaxed);
        let b_relaxed = b.clone().with_preferences(relaxed);
        assert!(!is_compatible(&a, &b));
        assert!(is_compatible(&a, &b_relaxed));
    }

    #[test]
    fn same_timezone_preference_requires_equal_offsets() {
        let strict = MatchingPreferences {
            same_timezone_only: true,
            ..Default::default()
        };
        let a = english_learner("ana").with_preferences(strict);
        let b_far = with_profile(
            "ben",
            MatchingProfile::new(
                vec![lang("es")],
                vec![TargetLanguage::new(lang("en"), CefrLevel::B1)],
                Vec::<String>::new(),
                60,
            )
            .unwrap(),
        );
        assert!(!is_compatible(&a, &b_far));
        assert!(is_compatible(&a, &spanish_learner("cai")));
    }
}
