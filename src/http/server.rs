//! HTTP server setup for the demo application.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handlers
//! - Wire up middleware (request ID, request log, timeout, body limit)
//! - Bind server to listener and serve until shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::config::AppConfig;
use crate::http::request::{RequestId, RequestIdLayer};
use crate::observability::request_log::RequestLogLayer;

/// Demo HTTP server.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server whose request log goes to `tracing`.
    pub fn new(config: AppConfig) -> Self {
        let log_layer = RequestLogLayer::with_config(config.request_log.to_log_config());
        Self::with_log_layer(config, log_layer)
    }

    /// Create a server with a caller-supplied request log layer.
    pub fn with_log_layer(config: AppConfig, log_layer: RequestLogLayer) -> Self {
        let router = Self::build_router(&config, log_layer);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request id, request log, timeout, body limit.
    #[allow(deprecated)]
    pub fn build_router(config: &AppConfig, log_layer: RequestLogLayer) -> Router {
        Router::new()
            .route("/slog/{id}", get(get_slog))
            .route("/slog", post(post_slog))
            .route("/health", get(health))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.limits.request_timeout_secs,
            )))
            .layer(log_layer)
            .layer(RequestIdLayer::new())
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with all layers applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn get_slog(Path(_id): Path<String>) -> impl IntoResponse {
    Json(json!({ "message": "slog" }))
}

async fn post_slog(Json(_payload): Json<Value>) -> impl IntoResponse {
    Json(json!({ "message": "slog" }))
}

async fn health(Extension(request_id): Extension<RequestId>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "request_id": request_id.as_str() }))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
