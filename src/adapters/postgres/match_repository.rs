//! PostgreSQL implementation of MatchRepository.
//!
//! The "one active match per pair" rule is checked in `save` under a
//! transaction-scoped advisory lock keyed on the unordered pair, so two
//! concurrent saves for the same pair serialize on the check.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{db_error, from_db_version, missed_update, to_db_version};
use crate::domain::foundation::{DomainError, ErrorCode, MatchId, Timestamp, UserId, Version};
use crate::domain::proposal::{Match, MatchState};
use crate::ports::MatchRepository;

const ACTIVE_STATES: [MatchState; 2] = [MatchState::Proposed, MatchState::Accepted];

#[derive(Clone)]
pub struct PostgresMatchRepository {
    pool: PgPool,
}

impl PostgresMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The pair in canonical order, so (a, b) and (b, a) share columns.
fn ordered_pair<'a>(a: &'a UserId, b: &'a UserId) -> (&'a str, &'a str) {
    if a.as_str() <= b.as_str() {
        (a.as_str(), b.as_str())
    } else {
        (b.as_str(), a.as_str())
    }
}

fn active_state_names() -> Vec<&'static str> {
    ACTIVE_STATES.iter().map(|s| s.as_str()).collect()
}

fn match_from_row(row: &sqlx::postgres::PgRow) -> Result<Match, DomainError> {
    let payload: Json<Match> = row.try_get("payload").map_err(db_error("decode match"))?;
    let version: i64 = row.try_get("version").map_err(db_error("decode match"))?;
    Ok(payload.0.with_version(from_db_version(version)))
}

#[async_trait]
impl MatchRepository for PostgresMatchRepository {
    async fn save(&self, m: &Match) -> Result<(), DomainError> {
        let (low, high) = ordered_pair(m.user1(), m.user2());
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{}|{}", low, high))
            .execute(&mut *tx)
            .await
            .map_err(db_error("lock user pair"))?;

        let existing: Option<uuid::Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM matches
            WHERE user_low = $1 AND user_high = $2 AND state = ANY($3)
            LIMIT 1
            "#,
        )
        .bind(low)
        .bind(high)
        .bind(active_state_names())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("check active match"))?;

        if existing.is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateActiveMatch,
                format!("Users {} and {} already have an active match", m.user1(), m.user2()),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO matches (id, user_low, user_high, state, expires_at, payload, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(m.id().as_uuid())
        .bind(low)
        .bind(high)
        .bind(m.state().as_str())
        .bind(m.expires_at().as_datetime())
        .bind(Json(m))
        .bind(to_db_version(m.version()))
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert match"))?;

        tx.commit().await.map_err(db_error("commit match"))?;
        Ok(())
    }

    async fn update(&self, m: &Match) -> Result<Version, DomainError> {
        let next = m.version().next();
        let stored = m.clone().with_version(next);

        let result = sqlx::query(
            r#"
            UPDATE matches SET
                state = $2,
                payload = $3,
                version = $4
            WHERE id = $1 AND version = $5
            "#,
        )
        .bind(m.id().as_uuid())
        .bind(m.state().as_str())
        .bind(Json(&stored))
        .bind(to_db_version(next))
        .bind(to_db_version(m.version()))
        .execute(&self.pool)
        .await
        .map_err(db_error("update match"))?;

        if result.rows_affected() == 0 {
            let current: Option<i64> = sqlx::query_scalar("SELECT version FROM matches WHERE id = $1")
                .bind(m.id().as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("read match version"))?;
            return Err(missed_update(
                "Match",
                &m.id().to_string(),
                current,
                m.version(),
                ErrorCode::MatchNotFound,
            ));
        }
        Ok(next)
    }

    async fn find_by_id(&self, id: &MatchId) -> Result<Option<Match>, DomainError> {
        let row = sqlx::query("SELECT payload, version FROM matches WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch match"))?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn find_active_for_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Match>, DomainError> {
        let (low, high) = ordered_pair(a, b);
        let row = sqlx::query(
            r#"
            SELECT payload, version FROM matches
            WHERE user_low = $1 AND user_high = $2 AND state = ANY($3)
            LIMIT 1
            "#,
        )
        .bind(low)
        .bind(high)
        .bind(active_state_names())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch active match"))?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn find_expired_proposals(&self, now: Timestamp) -> Result<Vec<Match>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT payload, version FROM matches
            WHERE state = $1 AND expires_at < $2
            ORDER BY expires_at
            "#,
        )
        .bind(MatchState::Proposed.as_str())
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch expired proposals"))?;

        rows.iter().map(match_from_row).collect()
    }

    async fn find_by_state(&self, state: MatchState) -> Result<Vec<Match>, DomainError> {
        let rows = sqlx::query("SELECT payload, version FROM matches WHERE state = $1")
            .bind(state.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("fetch matches by state"))?;

        rows.iter().map(match_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_order_ignores_argument_order() {
        let ana = UserId::new("ana").unwrap();
        let ben = UserId::new("ben").unwrap();
        assert_eq!(ordered_pair(&ana, &ben), ordered_pair(&ben, &ana));
        assert_eq!(ordered_pair(&ben, &ana), ("ana", "ben"));
    }

    #[test]
    fn only_proposed_and_accepted_are_active() {
        assert_eq!(active_state_names(), vec!["proposed", "accepted"]);
    }
}
