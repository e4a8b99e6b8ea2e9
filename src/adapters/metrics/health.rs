//! Health Check Server - Liveness, Readiness and Metrics
//!
//! Exposes /live, /ready and /metrics via axum 0.7. Readiness follows
//! the last state-source and trade-log health checks and flips to 503
//! on shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

use super::prometheus::QuoteMetrics;

/// Shared health state polled by `/ready`.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the state source answered its last health check.
    pub state_source_healthy: Arc<AtomicBool>,
    /// Whether the trade log was readable at the last sweep.
    pub trade_log_healthy: Arc<AtomicBool>,
    /// Cleared once shutdown begins.
    pub accepting: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (all healthy by default).
    pub fn new() -> Self {
        Self {
            state_source_healthy: Arc::new(AtomicBool::new(true)),
            trade_log_healthy: Arc::new(AtomicBool::new(true)),
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Check if the service is ready to quote.
    pub fn is_ready(&self) -> bool {
        self.state_source_healthy.load(Ordering::Relaxed)
            && self.trade_log_healthy.load(Ordering::Relaxed)
            && self.accepting.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
struct AppState {
    health: Arc<HealthState>,
    metrics: Arc<QuoteMetrics>,
}

/// Axum-based health and metrics HTTP server.
pub struct HealthServer {
    /// Health state shared with all components.
    state: Arc<HealthState>,
    metrics: Arc<QuoteMetrics>,
    /// Bind address, e.g. `0.0.0.0:9090`.
    bind_address: String,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: Arc<HealthState>, metrics: Arc<QuoteMetrics>, bind_address: String) -> Self {
        Self {
            state,
            metrics,
            bind_address,
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .with_state(AppState {
                health: Arc::clone(&self.state),
                metrics: Arc::clone(&self.metrics),
            })
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!("Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness: returns 200 only while the state source and trade log are healthy.
    async fn readiness(State(app): State<AppState>) -> impl IntoResponse {
        if app.health.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    async fn metrics(State(app): State<AppState>) -> impl IntoResponse {
        match app.metrics.render() {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                error!(error = %e, "Failed to render metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, String::new())
            }
        }
    }
}
