use serde::{Deserialize, Serialize};

use super::{HistoryKind, HistoryRecord};
use crate::domain::foundation::{domain_event, EventId, HistoryRecordId, MatchId, Timestamp};

/// Published after a history record is stored for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecorded {
    pub event_id: EventId,
    pub record_id: HistoryRecordId,
    pub kind: HistoryKind,
    pub match_id: MatchId,
    pub final_state: String,
    pub recorded_at: Timestamp,
}

domain_event!(
    HistoryRecorded,
    event_type = "history.recorded.v1",
    schema_version = 1,
    aggregate_id = match_id,
    aggregate_type = "Match",
    occurred_at = recorded_at,
    event_id = event_id
);

impl HistoryRecorded {
    pub fn from_record(record: &HistoryRecord) -> Self {
        Self {
            event_id: EventId::new(),
            record_id: record.id(),
            kind: record.kind(),
            match_id: record.match_id(),
            final_state: record.final_state().to_string(),
            recorded_at: record.recorded_at(),
        }
    }
}
