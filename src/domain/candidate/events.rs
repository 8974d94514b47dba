//! Candidate domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, EventId, Timestamp, UserId};

/// Published when a candidate joins the matchmaking queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQueued {
    pub event_id: EventId,
    pub user_id: UserId,
    pub priority: i32,
    pub queued_at: Timestamp,
}

domain_event!(
    CandidateQueued,
    event_type = "candidate.queued.v1",
    schema_version = 1,
    aggregate_id = user_id,
    aggregate_type = "Candidate",
    occurred_at = queued_at,
    event_id = event_id
);
