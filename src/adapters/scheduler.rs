//! SweepScheduler - Background loop driving matchmaking and the sweep.
//!
//! Every tick runs one matchmaking pass followed by one sweep pass. Time
//! transitions are therefore applied up to one interval late: a proposal
//! with a 90 s TTL expires somewhere between 90 s and 90 s + interval.
//! The default interval of 5 s keeps that lag small without busy polling.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a `watch` channel and finishes the pass in progress
//! before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::application::{
    MatchmakingPassReport, RunMatchmakingPassHandler, RunSweepHandler, SweepReport,
};
use crate::domain::foundation::CommandMetadata;

pub struct SweepScheduler {
    matchmaking: Arc<RunMatchmakingPassHandler>,
    sweep: Arc<RunSweepHandler>,
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(
        matchmaking: Arc<RunMatchmakingPassHandler>,
        sweep: Arc<RunSweepHandler>,
        interval: Duration,
    ) -> Self {
        Self {
            matchmaking,
            sweep,
            interval,
        }
    }

    /// Runs until `shutdown` turns true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "scheduler started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One matchmaking pass followed by one sweep. Failures are logged and
    /// the next tick starts fresh.
    pub async fn tick(&self) -> (Option<MatchmakingPassReport>, Option<SweepReport>) {
        let matchmaking = match self
            .matchmaking
            .handle(CommandMetadata::system("matchmaker"))
            .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "matchmaking pass failed");
                None
            }
        };

        let sweep = match self.sweep.handle(CommandMetadata::system("sweep")).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "sweep failed");
                None
            }
        };

        (matchmaking, sweep)
    }
}
