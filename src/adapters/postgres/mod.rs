//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! Each entity is stored as a JSONB `payload` next to the columns its
//! queries filter on and a `version` column. Updates are compare-and-set:
//! `UPDATE ... WHERE <key> = $1 AND version = $n`. Zero affected rows means
//! the row moved on (conflict) or never existed (not found); a follow-up
//! lookup tells the two apart.
//!
//! - `PostgresCandidateRepository` - Candidate registry
//! - `PostgresMatchRepository` - Match proposals
//! - `PostgresSessionRepository` - Conversation sessions
//! - `PostgresHistoryRepository` - Write-once history records

mod candidate_repository;
mod history_repository;
mod match_repository;
mod session_repository;

pub use candidate_repository::PostgresCandidateRepository;
pub use history_repository::PostgresHistoryRepository;
pub use match_repository::PostgresMatchRepository;
pub use session_repository::PostgresSessionRepository;

use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode, Version};

/// Opens the connection pool and, if configured, applies migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .connect(config.url.expose_secret())
        .await
        .map_err(db_error("connect to database"))?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))?;
        info!("database migrations applied");
    }

    Ok(pool)
}

/// Maps a sqlx error to a `DatabaseError` naming the failed action.
fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

fn to_db_version(version: Version) -> i64 {
    version.as_u64() as i64
}

fn from_db_version(raw: i64) -> Version {
    Version::from_u64(raw.max(0) as u64)
}

/// Classifies a compare-and-set that touched no rows.
fn missed_update(
    entity: &str,
    id: &str,
    stored: Option<i64>,
    loaded: Version,
    not_found: ErrorCode,
) -> DomainError {
    match stored {
        None => DomainError::new(not_found, format!("{} not found: {}", entity, id)),
        Some(raw) => DomainError::concurrency_conflict(format!(
            "{} {} was modified concurrently (stored {}, loaded {})",
            entity,
            id,
            from_db_version(raw),
            loaded
        )),
    }
}
