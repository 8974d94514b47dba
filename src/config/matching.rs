//! Matchmaking and proposal settings.

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::matchmaking::{PairingPolicy, DEFAULT_MINIMUM_SCORE};
use crate::domain::proposal::DEFAULT_PROPOSAL_TTL_SECS;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MatchingConfig {
    /// Seconds both users have to answer a proposal
    #[serde(default = "default_proposal_ttl")]
    pub proposal_ttl_secs: i64,

    /// Seconds a candidate may wait in the queue before the sweep removes them
    #[serde(default = "default_queue_ttl")]
    pub queue_ttl_secs: i64,

    /// Cooldown applied after a rejection
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,

    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    #[serde(default = "default_max_rejections_per_day")]
    pub max_rejections_per_day: u32,

    /// Pairings must score strictly above this
    #[serde(default = "default_minimum_score")]
    pub minimum_match_score: f64,

    /// Seconds a resolved match may leave its follow-ups unfinished before
    /// the sweep repairs them
    #[serde(default = "default_repair_after")]
    pub repair_after_secs: i64,
}

impl MatchingConfig {
    pub fn proposal_ttl(&self) -> Duration {
        Duration::seconds(self.proposal_ttl_secs)
    }

    pub fn rejection_cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_minutes)
    }

    pub fn repair_after(&self) -> Duration {
        Duration::seconds(self.repair_after_secs)
    }

    pub fn pairing_policy(&self) -> PairingPolicy {
        PairingPolicy {
            minimum_score: self.minimum_match_score,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.proposal_ttl_secs <= 0 {
            return Err(ValidationError::MustBePositive("matching.proposal_ttl_secs"));
        }
        if self.queue_ttl_secs <= 0 {
            return Err(ValidationError::MustBePositive("matching.queue_ttl_secs"));
        }
        if self.cooldown_minutes < 0 {
            return Err(ValidationError::OutOfRange {
                field: "matching.cooldown_minutes",
                min: 0.0,
                max: f64::MAX,
            });
        }
        if self.repair_after_secs <= 0 {
            return Err(ValidationError::MustBePositive("matching.repair_after_secs"));
        }
        if self.max_queue_size == 0 {
            return Err(ValidationError::MustBePositive("matching.max_queue_size"));
        }
        if !(0.0..=1.0).contains(&self.minimum_match_score) {
            return Err(ValidationError::OutOfRange {
                field: "matching.minimum_match_score",
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            proposal_ttl_secs: default_proposal_ttl(),
            queue_ttl_secs: default_queue_ttl(),
            cooldown_minutes: default_cooldown_minutes(),
            max_queue_size: default_max_queue_size(),
            max_rejections_per_day: default_max_rejections_per_day(),
            minimum_match_score: default_minimum_score(),
            repair_after_secs: default_repair_after(),
        }
    }
}

fn default_proposal_ttl() -> i64 {
    DEFAULT_PROPOSAL_TTL_SECS
}

fn default_queue_ttl() -> i64 {
    300
}

fn default_cooldown_minutes() -> i64 {
    5
}

fn default_max_queue_size() -> usize {
    1000
}

fn default_max_rejections_per_day() -> u32 {
    10
}

fn default_minimum_score() -> f64 {
    DEFAULT_MINIMUM_SCORE
}

fn default_repair_after() -> i64 {
    DEFAULT_PROPOSAL_TTL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchingConfig::default();
        assert_eq!(config.proposal_ttl(), Duration::seconds(90));
        assert_eq!(config.queue_ttl_secs, 300);
        assert_eq!(config.rejection_cooldown(), Duration::minutes(5));
        assert_eq!(config.max_queue_size, 1000);
        assert_eq!(config.max_rejections_per_day, 10);
        assert_eq!(config.pairing_policy().minimum_score, 0.5);
        assert_eq!(config.repair_after(), Duration::seconds(90));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = MatchingConfig {
            proposal_ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("matching.proposal_ttl_secs"))
        );

        let config = MatchingConfig {
            minimum_match_score: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
