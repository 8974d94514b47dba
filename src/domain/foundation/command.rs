//! Command metadata shared by all application handlers.
//!
//! Handlers accept a single `CommandMetadata` instead of separate
//! correlation/user/source parameters, and stamp it onto every event
//! they publish.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventEnvelope, UserId};

/// Metadata context for command handlers.
///
/// ```ignore
/// let envelope = metadata.stamp(event.to_envelope());
/// self.publisher.publish(envelope).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The user executing this command; `None` for system-initiated work.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// Links related operations across a single request or pass.
    correlation_id: String,

    /// Source of this command (e.g., "api", "matchmaker", "sweep").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Metadata for a command issued by a user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            correlation_id: Uuid::new_v4().to_string(),
            source: None,
        }
    }

    /// Metadata for a command issued by a background process.
    pub fn system(source: impl Into<String>) -> Self {
        Self {
            user_id: None,
            correlation_id: Uuid::new_v4().to_string(),
            source: Some(source.into()),
        }
    }

    /// Builder: Override the generated correlation ID.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Copies this metadata onto an outgoing event envelope.
    pub fn stamp(&self, envelope: EventEnvelope) -> EventEnvelope {
        let mut envelope = envelope.with_correlation_id(self.correlation_id.clone());
        if let Some(user) = &self.user_id {
            envelope = envelope.with_user_id(user.as_str());
        }
        if let Some(source) = &self.source {
            envelope = envelope.with_source(source.clone());
        }
        envelope
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Creates a test fixture with a fixed correlation ID.
    pub fn test_fixture() -> Self {
        Self::for_user(UserId::new("test-user-123").unwrap())
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}
