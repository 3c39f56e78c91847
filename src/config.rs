//! Configuration module for Pulseboard.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;

/// Hard cap on the fleet-view heartbeat lookback. Deployments may shorten
/// the window, never widen it.
const MAX_LOOKBACK_DAYS: i64 = 7;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "pulseboard.db")
    pub db_path: String,
    /// How many days of heartbeat history the fleet view fetches
    /// (default and maximum: 7)
    pub status_lookback_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "pulseboard.db".to_string(),
            status_lookback_days: MAX_LOOKBACK_DAYS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PULSEBOARD_HTTP_PORT`: HTTP port (default: 8080)
    /// - `PULSEBOARD_DB_PATH`: Database file path (default: "pulseboard.db")
    /// - `PULSEBOARD_STATUS_LOOKBACK_DAYS`: heartbeat lookback for the
    ///   fleet view, clamped to 1..=7 (default: 7)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("PULSEBOARD_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(db_path) = env::var("PULSEBOARD_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Ok(days_str) = env::var("PULSEBOARD_STATUS_LOOKBACK_DAYS") {
            if let Some(days) = parse_lookback_days(&days_str) {
                cfg.status_lookback_days = days;
            }
        }

        cfg
    }

    /// The heartbeat lookback window in seconds.
    pub fn status_lookback_sec(&self) -> i64 {
        self.status_lookback_days * 86_400
    }
}

/// Parse a lookback override, clamping it into the supported window.
/// Unparseable values fall back to the default instead.
fn parse_lookback_days(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .map(|days| days.clamp(1, MAX_LOOKBACK_DAYS))
}
