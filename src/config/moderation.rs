//! Content moderation settings.

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::session::ModerationPolicy;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModerationConfig {
    /// Assessments scoring at or above this are flagged as toxic
    #[serde(default = "default_toxicity_threshold")]
    pub toxicity_threshold: f64,

    #[serde(default = "default_true")]
    pub pii_detection_enabled: bool,
}

impl ModerationConfig {
    pub fn policy(&self) -> ModerationPolicy {
        ModerationPolicy {
            toxicity_threshold: self.toxicity_threshold,
            pii_detection_enabled: self.pii_detection_enabled,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.toxicity_threshold) {
            return Err(ValidationError::OutOfRange {
                field: "moderation.toxicity_threshold",
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            toxicity_threshold: default_toxicity_threshold(),
            pii_detection_enabled: true,
        }
    }
}

fn default_toxicity_threshold() -> f64 {
    0.7
}

fn default_true() -> bool {
    true
}
