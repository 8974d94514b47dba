//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `LINGUA_PAIR` prefix
//! and `__` between nesting levels. Every field has a default, so an empty
//! environment yields a working in-memory setup.
//!
//! # Example
//!
//! ```no_run
//! use lingua_pair::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod matching;
mod moderation;
mod server;
mod session;
mod sweep;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use matching::MatchingConfig;
pub use moderation::ModerationConfig;
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;
pub use sweep::SweepConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; in-memory adapters are used when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub moderation: ModerationConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LINGUA_PAIR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `LINGUA_PAIR__MATCHING__PROPOSAL_TTL_SECS=90` -> `matching.proposal_ttl_secs = 90`
    /// - `LINGUA_PAIR__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("LINGUA_PAIR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.matching.validate()?;
        self.session.validate()?;
        self.moderation.validate()?;
        self.sweep.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "LINGUA_PAIR__MATCHING__PROPOSAL_TTL_SECS",
        "LINGUA_PAIR__MATCHING__MINIMUM_MATCH_SCORE",
        "LINGUA_PAIR__SESSION__IDLE_TIMEOUT_MINUTES",
        "LINGUA_PAIR__SERVER__LOG_JSON",
        "LINGUA_PAIR__DATABASE__URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.matching, MatchingConfig::default());
        assert_eq!(config.session, SessionConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_overrides_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("LINGUA_PAIR__MATCHING__PROPOSAL_TTL_SECS", "120");
        env::set_var("LINGUA_PAIR__MATCHING__MINIMUM_MATCH_SCORE", "0.6");
        env::set_var("LINGUA_PAIR__SESSION__IDLE_TIMEOUT_MINUTES", "20");
        env::set_var("LINGUA_PAIR__SERVER__LOG_JSON", "true");
        env::set_var("LINGUA_PAIR__DATABASE__URL", "postgresql://test@localhost/test");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.matching.proposal_ttl_secs, 120);
        assert_eq!(config.matching.minimum_match_score, 0.6);
        assert_eq!(config.session.idle_timeout_minutes, 20);
        assert!(config.server.log_json);
        assert!(config.database.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_bad_section() {
        let config = AppConfig {
            sweep: SweepConfig { interval_secs: 0 },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("sweep.interval_secs"))
        );
    }
}
