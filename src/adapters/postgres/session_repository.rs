//! PostgreSQL implementation of SessionRepository.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{db_error, from_db_version, missed_update, to_db_version};
use crate::domain::foundation::{DomainError, ErrorCode, MatchId, SessionId, Version};
use crate::domain::session::{Session, SessionState};
use crate::ports::SessionRepository;

#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &sqlx::postgres::PgRow) -> Result<Session, DomainError> {
    let payload: Json<Session> = row.try_get("payload").map_err(db_error("decode session"))?;
    let version: i64 = row.try_get("version").map_err(db_error("decode session"))?;
    Ok(payload.0.with_version(from_db_version(version)))
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, match_id, state, last_activity_at, payload, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.match_id().as_uuid())
        .bind(session.state().as_str())
        .bind(session.last_activity_at().as_datetime())
        .bind(Json(session))
        .bind(to_db_version(session.version()))
        .execute(&self.pool)
        .await
        .map_err(db_error("insert session"))?;

        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<Version, DomainError> {
        let next = session.version().next();
        let stored = session.clone().with_version(next);

        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                state = $2,
                last_activity_at = $3,
                payload = $4,
                version = $5
            WHERE id = $1 AND version = $6
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.state().as_str())
        .bind(session.last_activity_at().as_datetime())
        .bind(Json(&stored))
        .bind(to_db_version(next))
        .bind(to_db_version(session.version()))
        .execute(&self.pool)
        .await
        .map_err(db_error("update session"))?;

        if result.rows_affected() == 0 {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT version FROM sessions WHERE id = $1")
                    .bind(session.id().as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error("read session version"))?;
            return Err(missed_update(
                "Session",
                &session.id().to_string(),
                current,
                session.version(),
                ErrorCode::SessionNotFound,
            ));
        }
        Ok(next)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query("SELECT payload, version FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch session"))?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_by_match(&self, match_id: &MatchId) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query("SELECT payload, version FROM sessions WHERE match_id = $1")
            .bind(match_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch session by match"))?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_live(&self) -> Result<Vec<Session>, DomainError> {
        let rows = sqlx::query(
            "SELECT payload, version FROM sessions WHERE state = ANY($1) ORDER BY last_activity_at",
        )
        .bind(vec![SessionState::Active.as_str(), SessionState::Paused.as_str()])
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch live sessions"))?;

        rows.iter().map(session_from_row).collect()
    }
}
