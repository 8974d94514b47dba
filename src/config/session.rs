//! Conversation session settings.

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::session::DEFAULT_PLANNED_MINUTES;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Hard cap; longer sessions are expired by the sweep
    #[serde(default = "default_max_duration_minutes")]
    pub max_duration_minutes: i64,

    #[serde(default = "default_planned_minutes")]
    pub default_planned_minutes: u32,

    #[serde(default = "default_turn_switch_interval")]
    pub turn_switch_interval_minutes: i64,

    /// Sessions without activity for this long are dropped by the sweep
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: i64,
}

impl SessionConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::minutes(self.max_duration_minutes)
    }

    pub fn turn_switch_interval(&self) -> Duration {
        Duration::minutes(self.turn_switch_interval_minutes)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::minutes(self.idle_timeout_minutes)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_duration_minutes <= 0 {
            return Err(ValidationError::MustBePositive("session.max_duration_minutes"));
        }
        if self.default_planned_minutes == 0 {
            return Err(ValidationError::MustBePositive("session.default_planned_minutes"));
        }
        if i64::from(self.default_planned_minutes) > self.max_duration_minutes {
            return Err(ValidationError::SessionLengthExceedsMaximum);
        }
        if self.turn_switch_interval_minutes <= 0 {
            return Err(ValidationError::MustBePositive("session.turn_switch_interval_minutes"));
        }
        if self.idle_timeout_minutes <= 0 {
            return Err(ValidationError::MustBePositive("session.idle_timeout_minutes"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration_minutes: default_max_duration_minutes(),
            default_planned_minutes: default_planned_minutes(),
            turn_switch_interval_minutes: default_turn_switch_interval(),
            idle_timeout_minutes: default_idle_timeout(),
        }
    }
}

fn default_max_duration_minutes() -> i64 {
    120
}

fn default_planned_minutes() -> u32 {
    DEFAULT_PLANNED_MINUTES
}

fn default_turn_switch_interval() -> i64 {
    10
}

fn default_idle_timeout() -> i64 {
    15
}
