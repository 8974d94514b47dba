//! PostgreSQL implementation of CandidateRepository.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{db_error, from_db_version, missed_update, to_db_version};
use crate::domain::candidate::{Candidate, CandidateStatus};
use crate::domain::foundation::{DomainError, ErrorCode, UserId, Version};
use crate::ports::CandidateRepository;

#[derive(Clone)]
pub struct PostgresCandidateRepository {
    pool: PgPool,
}

impl PostgresCandidateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn candidate_from_row(row: &sqlx::postgres::PgRow) -> Result<Candidate, DomainError> {
    let payload: Json<Candidate> = row.try_get("payload").map_err(db_error("decode candidate"))?;
    let version: i64 = row.try_get("version").map_err(db_error("decode candidate"))?;
    Ok(payload.0.with_version(from_db_version(version)))
}

#[async_trait]
impl CandidateRepository for PostgresCandidateRepository {
    async fn save(&self, candidate: &Candidate) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO candidates (user_id, status, queued_at, payload, version, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(candidate.user_id().as_str())
        .bind(candidate.status().as_str())
        .bind(candidate.queued_at().map(|t| *t.as_datetime()))
        .bind(Json(candidate))
        .bind(to_db_version(candidate.version()))
        .bind(candidate.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("insert candidate"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Candidate already registered: {}", candidate.user_id()),
            ));
        }
        Ok(())
    }

    async fn update(&self, candidate: &Candidate) -> Result<Version, DomainError> {
        let next = candidate.version().next();
        let stored = candidate.clone().with_version(next);

        let result = sqlx::query(
            r#"
            UPDATE candidates SET
                status = $2,
                queued_at = $3,
                payload = $4,
                version = $5,
                updated_at = $6
            WHERE user_id = $1 AND version = $7
            "#,
        )
        .bind(candidate.user_id().as_str())
        .bind(candidate.status().as_str())
        .bind(candidate.queued_at().map(|t| *t.as_datetime()))
        .bind(Json(&stored))
        .bind(to_db_version(next))
        .bind(candidate.updated_at().as_datetime())
        .bind(to_db_version(candidate.version()))
        .execute(&self.pool)
        .await
        .map_err(db_error("update candidate"))?;

        if result.rows_affected() == 0 {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT version FROM candidates WHERE user_id = $1")
                    .bind(candidate.user_id().as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error("read candidate version"))?;
            return Err(missed_update(
                "Candidate",
                candidate.user_id().as_str(),
                current,
                candidate.version(),
                ErrorCode::CandidateNotFound,
            ));
        }
        Ok(next)
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Candidate>, DomainError> {
        let row = sqlx::query("SELECT payload, version FROM candidates WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch candidate"))?;

        row.as_ref().map(candidate_from_row).transpose()
    }

    async fn find_queued(&self) -> Result<Vec<Candidate>, DomainError> {
        let rows = sqlx::query(
            "SELECT payload, version FROM candidates WHERE status = $1 ORDER BY queued_at",
        )
        .bind(CandidateStatus::Queued.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch queued candidates"))?;

        rows.iter().map(candidate_from_row).collect()
    }

    async fn count_queued(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE status = $1")
            .bind(CandidateStatus::Queued.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count queued candidates"))?;
        Ok(count.max(0) as usize)
    }

    async fn find_committed(&self) -> Result<Vec<Candidate>, DomainError> {
        let rows = sqlx::query("SELECT payload, version FROM candidates WHERE status = ANY($1)")
            .bind(vec![
                CandidateStatus::Proposed.as_str(),
                CandidateStatus::Matched.as_str(),
            ])
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("fetch committed candidates"))?;

        rows.iter().map(candidate_from_row).collect()
    }
}
