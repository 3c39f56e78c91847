//! Web server module.

mod error;
mod handlers;

pub use error::*;
pub use handlers::*;

use crate::config::ServerConfig;
use crate::db::Store;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
}

/// Web server for Pulseboard.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, store: Arc<Store>) -> Self {
        Self {
            state: AppState { config, store },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        // The status page is served from a different origin.
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            .route("/status", get(handlers::handle_status))
            .route("/monitors/{id}/latency", get(handlers::handle_latency))
            .route("/monitors/{id}/uptime", get(handlers::handle_uptime))
            .route("/health", get(handlers::handle_health))
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
