//! Moderation flags recorded against a session.
//!
//! The session only logs flags and counts toxicity warnings. Acting on
//! them (ending the session, striking a user) is left to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationKind {
    Toxicity,
    InappropriateContent,
    PiiDetected,
    UserReport,
}

impl ModerationKind {
    /// Kinds that count toward the session's toxicity warnings.
    pub fn counts_as_toxicity_warning(&self) -> bool {
        matches!(
            self,
            ModerationKind::Toxicity | ModerationKind::InappropriateContent
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationKind::Toxicity => "toxicity",
            ModerationKind::InappropriateContent => "inappropriate_content",
            ModerationKind::PiiDetected => "pii_detected",
            ModerationKind::UserReport => "user_report",
        }
    }
}

impl fmt::Display for ModerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a session's append-only moderation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationFlag {
    pub kind: ModerationKind,
    pub details: JsonValue,
    pub flagged_at: Timestamp,
}

/// Content-safety verdict for a single message, produced by an external
/// classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentAssessment {
    /// Classifier toxicity score in [0, 1].
    pub toxicity_score: f64,
    pub contains_pii: bool,
}

/// Thresholds for turning an assessment into flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModerationPolicy {
    pub toxicity_threshold: f64,
    pub pii_detection_enabled: bool,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            toxicity_threshold: 0.7,
            pii_detection_enabled: true,
        }
    }
}

impl ModerationPolicy {
    /// Flags warranted by an assessment. Scores at or above the threshold
    /// count as toxic.
    pub fn flags_for(&self, assessment: &ContentAssessment) -> Vec<ModerationKind> {
        let mut kinds = Vec::new();
        if assessment.toxicity_score >= self.toxicity_threshold {
            kinds.push(ModerationKind::Toxicity);
        }
        if self.pii_detection_enabled && assessment.contains_pii {
            kinds.push(ModerationKind::PiiDetected);
        }
        kinds
    }
}
