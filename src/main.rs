//! Lingua Pair service binary.
//!
//! Loads configuration, picks PostgreSQL or in-memory storage, and runs the
//! matchmaking + sweep scheduler until Ctrl-C.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lingua_pair::adapters::postgres::{
    self, PostgresCandidateRepository, PostgresHistoryRepository, PostgresMatchRepository,
    PostgresSessionRepository,
};
use lingua_pair::adapters::{
    InMemoryCandidateRepository, InMemoryEventBus, InMemoryHistoryRepository,
    InMemoryMatchRepository, InMemorySessionRepository, SweepScheduler, SystemClock,
};
use lingua_pair::application::{RunMatchmakingPassHandler, RunSweepHandler};
use lingua_pair::config::AppConfig;
use lingua_pair::ports::{
    CandidateRepository, Clock, EventPublisher, HistoryRepository, MatchRepository,
    SessionRepository,
};

struct Repositories {
    candidates: Arc<dyn CandidateRepository>,
    matches: Arc<dyn MatchRepository>,
    sessions: Arc<dyn SessionRepository>,
    history: Arc<dyn HistoryRepository>,
}

async fn repositories(config: &AppConfig) -> Result<Repositories, Box<dyn std::error::Error>> {
    match &config.database {
        Some(database) => {
            let pool = postgres::connect(database).await?;
            tracing::info!("Using PostgreSQL storage");
            Ok(Repositories {
                candidates: Arc::new(PostgresCandidateRepository::new(pool.clone())),
                matches: Arc::new(PostgresMatchRepository::new(pool.clone())),
                sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
                history: Arc::new(PostgresHistoryRepository::new(pool)),
            })
        }
        None => {
            tracing::warn!("No database configured; state is kept in memory only");
            Ok(Repositories {
                candidates: Arc::new(InMemoryCandidateRepository::new()),
                matches: Arc::new(InMemoryMatchRepository::new()),
                sessions: Arc::new(InMemorySessionRepository::new()),
                history: Arc::new(InMemoryHistoryRepository::new()),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;
    config.validate()?;

    // Initialize logging
    let json = config.server.log_json;
    tracing_subscriber::registry()
        .with(config.server.env_filter())
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        proposal_ttl_secs = config.matching.proposal_ttl_secs,
        sweep_interval_secs = config.sweep.interval_secs,
        "Starting lingua-pair"
    );

    let repos = repositories(&config).await?;
    let bus: Arc<dyn EventPublisher> = Arc::new(InMemoryEventBus::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let matchmaking = RunMatchmakingPassHandler::new(
        repos.candidates.clone(),
        repos.matches.clone(),
        bus.clone(),
        clock.clone(),
        config.matching.clone(),
    );
    let sweep = RunSweepHandler::new(
        repos.candidates,
        repos.matches,
        repos.sessions,
        repos.history,
        bus,
        clock,
        config.matching.clone(),
        config.session.clone(),
    );
    let scheduler = Arc::new(SweepScheduler::new(
        Arc::new(matchmaking),
        Arc::new(sweep),
        config.sweep.interval(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown_tx.send(true)?;
    runner.await?;

    Ok(())
}
