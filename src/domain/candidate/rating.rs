//! Partner rating value object and running-mean accumulator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Mean reported when a candidate has not been rated yet.
pub const DEFAULT_AVERAGE_RATING: f64 = 5.0;

/// A single partner rating in [1, 5].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Creates a rating, rejecting NaN and values outside [1, 5].
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(ValidationError::out_of_range(
                "rating",
                MIN_RATING,
                MAX_RATING,
                value,
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Running mean of received ratings.
///
/// The sum is Kahan-compensated so long histories do not drift.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingAccumulator {
    count: u32,
    sum: f64,
    compensation: f64,
}

impl RatingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rating to the running sum.
    pub fn record(&mut self, rating: Rating) {
        let y = rating.value() - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
        self.count += 1;
    }

    /// Number of ratings recorded.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean rating, or 5.0 before any rating was recorded.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return DEFAULT_AVERAGE_RATING;
        }
        (self.sum / f64::from(self.count)).clamp(MIN_RATING, MAX_RATING)
    }
}
