//! Periodic lifecycle sweep scheduler
//!
//! Owns its interval loop explicitly; the binary decides when it
//! starts and the handle it runs on. A failed sweep is logged and the
//! loop keeps going, the next tick retries from current state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use hackmate_core::{run_sweep, Database, SweepOutcome};

pub struct SweepScheduler {
    db: Arc<Mutex<Database>>,
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(db: Arc<Mutex<Database>>, interval: Duration) -> Self {
        Self { db, interval }
    }

    /// Run the sweep loop until the task is dropped
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // Catching up on missed ticks would just stack no-op sweeps
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs(), "Sweep scheduler started");
        loop {
            ticker.tick().await;
            self.tick(Utc::now()).await;
        }
    }

    /// One sweep pass at the given instant
    #[instrument(skip(self))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Option<SweepOutcome> {
        let mut db = self.db.lock().await;
        match run_sweep(&mut db, now) {
            Ok(outcome) => {
                if outcome.is_noop() {
                    debug!("Sweep made no changes");
                }
                Some(outcome)
            }
            Err(e) => {
                error!("Lifecycle sweep failed: {}", e);
                None
            }
        }
    }
}
