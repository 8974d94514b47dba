//! Weighted compatibility score over named matching factors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scored aspect of how well two learners fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Factor {
    LevelAffinity,
    NativeTargetMatch,
    InterestOverlap,
    TimezoneOverlap,
    QualityScore,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::LevelAffinity,
        Factor::NativeTargetMatch,
        Factor::InterestOverlap,
        Factor::TimezoneOverlap,
        Factor::QualityScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::LevelAffinity => "level_affinity",
            Factor::NativeTargetMatch => "native_target_match",
            Factor::InterestOverlap => "interest_overlap",
            Factor::TimezoneOverlap => "timezone_overlap",
            Factor::QualityScore => "quality_score",
        }
    }

    /// Contribution of this factor to the score. The weights sum to 1.
    pub fn weight(&self) -> f64 {
        match self {
            Factor::LevelAffinity => 0.25,
            Factor::NativeTargetMatch => 0.30,
            Factor::InterestOverlap => 0.20,
            Factor::TimezoneOverlap => 0.15,
            Factor::QualityScore => 0.10,
        }
    }

    pub fn from_name(name: &str) -> Option<Factor> {
        Factor::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Factor values keyed by factor name.
///
/// Names outside [`Factor`] are carried (they may come from stored
/// history) but never contribute to the score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchingFactors(BTreeMap<String, f64>);

impl MatchingFactors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a known factor.
    pub fn with(mut self, factor: Factor, value: f64) -> Self {
        self.set(factor, value);
        self
    }

    pub fn set(&mut self, factor: Factor, value: f64) {
        self.0.insert(factor.as_str().to_string(), value);
    }

    /// Sets a factor by raw name.
    pub fn set_named(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, factor: Factor) -> Option<f64> {
        self.0.get(factor.as_str()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for MatchingFactors {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Combines factors into a compatibility score in [0, 1].
///
/// Missing factors contribute 0. Individual values are not clamped; only
/// the weighted sum is. A NaN sum scores 0.
pub fn score(factors: &MatchingFactors) -> f64 {
    let total: f64 = Factor::ALL
        .iter()
        .map(|f| f.weight() * factors.get(*f).unwrap_or(0.0))
        .sum();

    if total.is_nan() {
        return 0.0;
    }
    total.clamp(0.0, 1.0)
}
