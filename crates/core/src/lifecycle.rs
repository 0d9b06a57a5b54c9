//! Hackathon lifecycle sweep
//!
//! One periodic pass moves hackathons along `approved -> live ->
//! expired` based on their schedule. The caller supplies the current
//! time, which keeps the sweep deterministic under test and lets a
//! missed run catch up cleanly.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::error::Result;
use crate::storage::{Database, HackathonStore};

/// Counts of rows the sweep changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    pub went_live: u64,
    pub expired: u64,
}

impl SweepOutcome {
    pub fn is_noop(&self) -> bool {
        self.went_live == 0 && self.expired == 0
    }
}

/// Run one lifecycle sweep at the given instant.
///
/// Both updates run in a single write transaction. Expiry runs first:
/// an approved hackathon whose whole window already passed goes
/// straight to expired without ever being live.
#[instrument(skip(db))]
pub fn run_sweep(db: &mut Database, now: DateTime<Utc>) -> Result<SweepOutcome> {
    let tx = db.immediate_transaction()?;

    let store = HackathonStore::new(&tx);
    let expired = store.expire_ended(now)?;
    let went_live = store.go_live(now)?;

    tx.commit()?;

    let outcome = SweepOutcome { went_live, expired };
    if !outcome.is_noop() {
        info!(
            went_live = outcome.went_live,
            expired = outcome.expired,
            "Lifecycle sweep applied transitions"
        );
    }
    Ok(outcome)
}
