//! Trade-Signal Dashboard — Entry Point
//!
//! Loads configuration, connects storage, and serves the HTTP/WebSocket API
//! that the MT4-side event source and the browser dashboard talk to.
//! Handles graceful shutdown on SIGINT/SIGTERM.

mod config;
mod db;
mod error;
mod events;
mod lifecycle;
mod logging;
mod telegram;
mod web;

use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::pool;
use crate::events::bus::EventBus;
use crate::telegram::notifier::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if missing)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    logging::structured::init_logging(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        retention_days = config.retention.max_age_days,
        "trade-signal-dashboard starting"
    );

    let db_pool = pool::create_pool(&config.database.url).await?;
    pool::run_migrations(&db_pool).await?;
    info!("database connected and migrations applied");

    let bus = Arc::new(EventBus::new(1024));

    let notifier = Arc::new(Notifier::new(&config.telegram));
    if !notifier.enabled() {
        warn!("telegram not configured, notifications disabled");
    }

    let server = web::server::WebServer::new(
        config.server.clone(),
        db_pool,
        notifier,
        bus,
        config.auth.clone(),
        config.retention.clone(),
    );

    let shutdown = async {
        let ctrl_c = signal::ctrl_c();
        #[cfg(unix)]
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = ctrl_c => { info!("received SIGINT"); }
            _ = sigterm.recv() => { info!("received SIGTERM"); }
        }
    };

    server.start(shutdown).await?;

    info!("shutdown complete");
    Ok(())
}
