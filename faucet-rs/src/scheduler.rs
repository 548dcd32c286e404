//! Nightly ledger reset
//!
//! Drops entries from previous days at the start of each day. Quota checks
//! already ignore stale entries, so this only reclaims space.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::quota::QuotaEngine;

/// Period between resets once the first one has run
pub const RESET_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic pruning of the ledger
pub struct ResetScheduler {
    engine: Arc<QuotaEngine>,
    clock: Clock,
}

impl ResetScheduler {
    pub fn new(engine: Arc<QuotaEngine>, clock: Clock) -> Self {
        Self { engine, clock }
    }

    /// Prune once against the clock's current day
    pub async fn run_once(&self) -> Result<usize> {
        let today = self.clock.today();
        let removed = self.engine.prune(today).await?;
        info!("Ledger reset for {}: removed {} stale entries", today, removed);
        Ok(removed)
    }

    /// Start the background task: first reset at the next midnight, then
    /// every 24 hours until the process exits
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let delay = self.clock.duration_until_next_midnight();
        self.spawn_after(delay, RESET_PERIOD)
    }

    /// Start the background task with an explicit first delay and period
    pub fn spawn_after(self: Arc<Self>, first: Duration, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Ledger reset scheduled in {}s, then every {}s",
                first.as_secs(),
                period.as_secs()
            );

            let mut interval = tokio::time::interval_at(Instant::now() + first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if let Err(e) = self.run_once().await {
                    error!("Scheduled ledger reset failed: {}", e);
                }
            }
        })
    }
}
