//! Axum HTTP server — dashboard API, static files, live-update socket.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;

use crate::config::{AuthConfig, RetentionConfig, ServerConfig};
use crate::events::bus::EventBus;
use crate::telegram::notifier::Notifier;

use super::{auth, routes, ws};

/// Shared state for all web routes.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub notifier: Arc<Notifier>,
    pub bus: Arc<EventBus>,
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
}

/// Axum web server for the dashboard and the event-ingestion API.
pub struct WebServer {
    config: ServerConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(
        config: ServerConfig,
        db: PgPool,
        notifier: Arc<Notifier>,
        bus: Arc<EventBus>,
        auth: AuthConfig,
        retention: RetentionConfig,
    ) -> Self {
        Self {
            config,
            state: AppState {
                db,
                notifier,
                bus,
                auth,
                retention,
            },
        }
    }

    /// Serve until the shutdown future resolves.
    pub async fn start(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let session_store = MemoryStore::default();
        let session_layer = SessionManagerLayer::new(session_store)
            .with_secure(false)
            .with_expiry(Expiry::OnInactivity(Duration::minutes(60)));

        let app = Router::new()
            .merge(routes::api_routes())
            .merge(auth::auth_routes())
            .route("/ws", get(ws::websocket_handler))
            .fallback_service(ServeDir::new("public"))
            .layer(session_layer)
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.port));
        info!(port = self.config.port, "dashboard server starting");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
