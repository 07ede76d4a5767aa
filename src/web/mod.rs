//! Web layer module
//!
//! Thin handlers over the dispatcher:
//! - `GET /{size}` serves a random image at a catalog size
//! - `GET /` redirects to the largest size
//! - `GET /health` reports pool, refresh, cache and precache state

use anyhow::Result;
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::WebConfig;
use crate::job_scheduling::{PrecacheQueue, SharedRefreshStatus};
use crate::services::{ImageCache, ImageDispatcher, SourcePool};

pub mod handlers;
pub mod middleware;
pub mod responses;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ImageDispatcher>,
    pub pool: SourcePool,
    pub cache: Arc<ImageCache>,
    pub refresh_status: SharedRefreshStatus,
    pub precache_queue: Arc<PrecacheQueue>,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", config.host, config.port, e))?;

        Ok(Self {
            app: create_router(state, config.max_request_body_bytes),
            addr,
        })
    }

    /// Serve with cancellation support and ready notification
    ///
    /// `ready_signal` fires once the listener is bound (or failed to bind).
    /// Without a cancellation token the server stops on SIGTERM or SIGINT.
    pub async fn serve_with_cancellation(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<()>>,
        cancellation_token: Option<CancellationToken>,
    ) -> Result<()> {
        let listener = match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => listener,
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                return Err(anyhow::anyhow!("{}", bind_err_msg));
            }
        };

        let _ = ready_signal.send(Ok(()));
        tracing::info!("Listening on http://{}", self.addr);

        let graceful = async move {
            match cancellation_token {
                Some(token) => {
                    token.cancelled().await;
                    tracing::info!("Web server received cancellation signal, shutting down gracefully");
                }
                None => shutdown_signal().await,
            }
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(graceful)
            .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Build the router with its middleware stack
pub fn create_router(state: AppState, max_request_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::images::redirect_to_largest))
        .route("/health", get(handlers::health::health_check))
        .route("/{size}", get(handlers::images::serve_image))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_request_body_bytes))
                .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
                .layer(axum::middleware::from_fn(middleware::request_logging_middleware)),
        )
        .with_state(state)
}

/// Resolves on SIGTERM or SIGINT (Ctrl+C elsewhere)
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down gracefully"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            _ => {
                tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl+C, shutting down gracefully");
    }
}
