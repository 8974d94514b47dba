use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, MatchId};
use crate::domain::history::HistoryRecord;
use crate::ports::HistoryRepository;

/// Append-only in-memory history log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryRepository {
    records: Arc<RwLock<Vec<HistoryRecord>>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let exists = records
            .iter()
            .any(|r| r.kind() == record.kind() && r.match_id() == record.match_id());
        if exists {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn amend_feedback(&self, record: &HistoryRecord) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|r| r.kind() == record.kind() && r.match_id() == record.match_id());
        match stored {
            Some(stored) if record.user_feedback().len() > stored.user_feedback().len() => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_match(&self, match_id: &MatchId) -> Result<Vec<HistoryRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.match_id() == match_id)
            .cloned()
            .collect())
    }
}
