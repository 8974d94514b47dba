use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::check_version;
use crate::domain::foundation::{DomainError, ErrorCode, MatchId, Timestamp, UserId, Version};
use crate::domain::proposal::{Match, MatchState};
use crate::ports::MatchRepository;

/// In-memory match store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMatchRepository {
    matches: Arc<RwLock<HashMap<MatchId, Match>>>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored match (useful for tests)
    pub async fn all(&self) -> Vec<Match> {
        self.matches.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn save(&self, m: &Match) -> Result<(), DomainError> {
        let mut matches = self.matches.write().await;
        let duplicate = matches
            .values()
            .any(|existing| existing.state().is_active() && existing.involves_pair(m.user1(), m.user2()));
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateActiveMatch,
                format!("Users {} and {} already have an active match", m.user1(), m.user2()),
            ));
        }
        matches.insert(m.id(), m.clone());
        Ok(())
    }

    async fn update(&self, m: &Match) -> Result<Version, DomainError> {
        let mut matches = self.matches.write().await;
        let stored = matches.get(&m.id()).ok_or_else(|| {
            DomainError::new(ErrorCode::MatchNotFound, format!("Match not found: {}", m.id()))
        })?;
        let next = check_version("Match", &m.id().to_string(), stored.version(), m.version())?;
        matches.insert(m.id(), m.clone().with_version(next));
        Ok(next)
    }

    async fn find_by_id(&self, id: &MatchId) -> Result<Option<Match>, DomainError> {
        Ok(self.matches.read().await.get(id).cloned())
    }

    async fn find_active_for_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Match>, DomainError> {
        Ok(self
            .matches
            .read()
            .await
            .values()
            .find(|m| m.state().is_active() && m.involves_pair(a, b))
            .cloned())
    }

    async fn find_expired_proposals(&self, now: Timestamp) -> Result<Vec<Match>, DomainError> {
        Ok(self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.state() == MatchState::Proposed && m.is_expired(now))
            .cloned()
            .collect())
    }

    async fn find_by_state(&self, state: MatchState) -> Result<Vec<Match>, DomainError> {
        Ok(self
            .matches
            .read()
            .await
            .values()
            .filter(|m| m.state() == state)
            .cloned()
            .collect())
    }
}
