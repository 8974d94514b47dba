//! PostgreSQL implementation of HistoryRepository.
//!
//! Write-once per (kind, match id): the unique constraint plus
//! `ON CONFLICT DO NOTHING` turns a repeated append into a no-op. Feedback
//! amendments rewrite the payload only when they carry more entries.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::db_error;
use crate::domain::foundation::{DomainError, MatchId};
use crate::domain::history::HistoryRecord;
use crate::ports::HistoryRepository;

#[derive(Clone)]
pub struct PostgresHistoryRepository {
    pool: PgPool,
}

impl PostgresHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PostgresHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO match_history (id, kind, match_id, recorded_at, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (kind, match_id) DO NOTHING
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.kind().as_str())
        .bind(record.match_id().as_uuid())
        .bind(record.recorded_at().as_datetime())
        .bind(Json(record))
        .execute(&self.pool)
        .await
        .map_err(db_error("append history"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn amend_feedback(&self, record: &HistoryRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE match_history SET payload = $3
            WHERE kind = $1 AND match_id = $2
              AND jsonb_array_length(COALESCE(payload->'user_feedback', '[]'::jsonb)) < $4
            "#,
        )
        .bind(record.kind().as_str())
        .bind(record.match_id().as_uuid())
        .bind(Json(record))
        .bind(record.user_feedback().len() as i32)
        .execute(&self.pool)
        .await
        .map_err(db_error("amend history feedback"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_match(&self, match_id: &MatchId) -> Result<Vec<HistoryRecord>, DomainError> {
        let rows = sqlx::query(
            "SELECT payload FROM match_history WHERE match_id = $1 ORDER BY recorded_at",
        )
        .bind(match_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch history"))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Json<HistoryRecord>, _>("payload")
                    .map(|json| json.0)
                    .map_err(db_error("decode history"))
            })
            .collect()
    }
}
