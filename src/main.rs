//! Pulseboard - public status and uptime query engine.
//!
//! Serves the read-only JSON surface of an uptime-monitoring service:
//! fleet status, per-monitor latency profiles, and availability over a
//! time range. Check scheduling and outage detection write the datastore
//! elsewhere; this process only reads it.

mod config;
mod db;
mod report;
mod web;

use config::ServerConfig;
use db::Store;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pulseboard=info".parse()?),
        )
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting Pulseboard on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    // Start web server
    let server = Server::new(cfg, store);
    server.start().await?;

    Ok(())
}
