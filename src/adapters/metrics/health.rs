//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum for Docker health checks
//! and orchestrator probes. Readiness follows the poller's connection
//! status: 503 while connecting, in fallback mode, or during graceful
//! shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::domain::market_data::ConnectionStatus;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Poller connection status.
    status_rx: watch::Receiver<ConnectionStatus>,
    /// Cleared at the start of graceful shutdown.
    accepting: Arc<AtomicBool>,
}

impl HealthState {
    /// Create health state wired to a poller's status channel.
    pub fn new(status_rx: watch::Receiver<ConnectionStatus>) -> Self {
        Self {
            status_rx,
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flip readiness to 503 for the remainder of the process lifetime.
    pub fn mark_shutting_down(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }

    /// Ready only when live data is flowing and we are not shutting down.
    pub fn is_ready(&self) -> bool {
        self.accepting.load(Ordering::Relaxed)
            && *self.status_rx.borrow() == ConnectionStatus::Connected
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    /// Health state shared with all components.
    state: HealthState,
    /// Bind port.
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: HealthState, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the health check server until shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(self.state.clone());

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 only while live data is flowing.
    async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
        if state.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}
