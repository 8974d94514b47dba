//! EventSubscriber port - Interface for subscribing to domain events.
//!
//! Notification and analytics collaborators register here for the event
//! types they care about (e.g. `match.proposed.v1` to prompt both users).

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler for processing domain events.
///
/// Handlers must be idempotent; delivery is at-least-once.
///
/// # Example
///
/// ```ignore
/// struct ProposalNotifier { /* ... */ }
///
/// #[async_trait]
/// impl EventHandler for ProposalNotifier {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         let proposed: MatchProposed = event.payload_as()?;
///         // Push a prompt to both users...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "ProposalNotifier"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for subscribing to domain events.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to a specific event type.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    /// Subscribe the same handler to several event types.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>);
}

/// Combined publish + subscribe capability.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
