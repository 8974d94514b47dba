use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::check_version;
use crate::domain::foundation::{DomainError, ErrorCode, MatchId, SessionId, Version};
use crate::domain::session::Session;
use crate::ports::SessionRepository;

/// In-memory session store.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if sessions.values().any(|s| s.match_id() == session.match_id()) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Match {} already has a session", session.match_id()),
            ));
        }
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<Version, DomainError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get(&session.id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )
        })?;
        let next = check_version(
            "Session",
            &session.id().to_string(),
            stored.version(),
            session.version(),
        )?;
        sessions.insert(session.id(), session.clone().with_version(next));
        Ok(next)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn find_by_match(&self, match_id: &MatchId) -> Result<Option<Session>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| &s.match_id() == match_id)
            .cloned())
    }

    async fn find_live(&self) -> Result<Vec<Session>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_terminal())
            .cloned()
            .collect())
    }
}
