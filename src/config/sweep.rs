//! Background scheduler settings.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SweepConfig {
    /// Seconds between matchmaking + sweep passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl SweepConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::MustBePositive("sweep.interval_secs"));
        }
        Ok(())
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        assert_eq!(SweepConfig::default().interval(), Duration::from_secs(5));
        assert!(SweepConfig { interval_secs: 0 }.validate().is_err());
    }
}
