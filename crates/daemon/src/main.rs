//! Hackmate lifecycle daemon
//!
//! Opens the platform database and runs the periodic hackathon
//! lifecycle sweep. Takes an optional config file path as its only
//! argument.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hackmate_core::Database;

mod config;
mod scheduler;

use config::Config;
use scheduler::SweepScheduler;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Hackmate daemon");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match Config::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(parent) = config.database_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!("Failed to create data directory: {}", e);
            std::process::exit(1);
        }
    }

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let scheduler = SweepScheduler::new(
        Arc::new(Mutex::new(db)),
        Duration::from_secs(config.sweep_interval_minutes * 60),
    );
    scheduler.run().await;
}
