use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::check_version;
use crate::domain::candidate::{Candidate, CandidateStatus};
use crate::domain::foundation::{DomainError, ErrorCode, UserId, Version};
use crate::ports::CandidateRepository;

/// In-memory candidate store keyed by user.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateRepository {
    candidates: Arc<RwLock<HashMap<UserId, Candidate>>>,
}

impl InMemoryCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored candidates (useful for tests)
    pub async fn len(&self) -> usize {
        self.candidates.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.candidates.read().await.is_empty()
    }
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn save(&self, candidate: &Candidate) -> Result<(), DomainError> {
        let mut candidates = self.candidates.write().await;
        if candidates.contains_key(candidate.user_id()) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Candidate already registered: {}", candidate.user_id()),
            ));
        }
        candidates.insert(candidate.user_id().clone(), candidate.clone());
        Ok(())
    }

    async fn update(&self, candidate: &Candidate) -> Result<Version, DomainError> {
        let mut candidates = self.candidates.write().await;
        let stored = candidates.get(candidate.user_id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::CandidateNotFound,
                format!("Candidate not found: {}", candidate.user_id()),
            )
        })?;
        let next = check_version(
            "Candidate",
            candidate.user_id().as_str(),
            stored.version(),
            candidate.version(),
        )?;
        candidates.insert(
            candidate.user_id().clone(),
            candidate.clone().with_version(next),
        );
        Ok(next)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Candidate>, DomainError> {
        Ok(self.candidates.read().await.get(user_id).cloned())
    }

    async fn find_queued(&self) -> Result<Vec<Candidate>, DomainError> {
        Ok(self
            .candidates
            .read()
            .await
            .values()
            .filter(|c| c.status() == CandidateStatus::Queued)
            .cloned()
            .collect())
    }

    async fn count_queued(&self) -> Result<usize, DomainError> {
        Ok(self
            .candidates
            .read()
            .await
            .values()
            .filter(|c| c.status() == CandidateStatus::Queued)
            .count())
    }

    async fn find_committed(&self) -> Result<Vec<Candidate>, DomainError> {
        Ok(self
            .candidates
            .read()
            .await
            .values()
            .filter(|c| c.status().is_committed())
            .cloned()
            .collect())
    }
}
