//! Prometheus Metrics Registry - Poller Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers fetch outcomes by provenance, cache hits, fallback
//! transitions, and the current connection status.
//!
//! The registry observes the poller from the outside: it subscribes to
//! the snapshot broadcast and the status watch channel, so the usecases
//! layer stays free of metrics plumbing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::domain::market_data::{ConnectionStatus, DataSource, MarketSnapshot};

/// Numeric encoding of ConnectionStatus for the gauge.
fn status_code(status: ConnectionStatus) -> i64 {
    match status {
        ConnectionStatus::Connecting => 0,
        ConnectionStatus::Connected => 1,
        ConnectionStatus::Fallback => 2,
    }
}

/// Centralized Prometheus metrics for the poller.
///
/// All metrics follow the naming convention `gridpulse_*` and carry a
/// `data_type` label for per-category filtering.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Completed fetches by data type and provenance.
    pub fetches_total: IntCounterVec,
    /// Fetches served from the TTL cache.
    pub cache_hits_total: IntCounterVec,
    /// Transitions into fallback mode.
    pub fallback_transitions_total: IntCounter,
    /// Connection status (0=connecting, 1=connected, 2=fallback).
    pub connection_status: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let fetches_total = IntCounterVec::new(
            Opts::new(
                "gridpulse_fetches_total",
                "Completed fetches by data type and provenance",
            ),
            &["data_type", "source"],
        )?;

        let cache_hits_total = IntCounterVec::new(
            Opts::new(
                "gridpulse_cache_hits_total",
                "Fetches served from the TTL cache without a gateway call",
            ),
            &["data_type"],
        )?;

        let fallback_transitions_total = IntCounter::new(
            "gridpulse_fallback_transitions_total",
            "Transitions from live into fallback mode",
        )?;

        let connection_status = IntGauge::new(
            "gridpulse_connection_status",
            "Connection status (0=connecting, 1=connected, 2=fallback)",
        )?;

        registry.register(Box::new(fetches_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(fallback_transitions_total.clone()))?;
        registry.register(Box::new(connection_status.clone()))?;

        Ok(Self {
            registry,
            fetches_total,
            cache_hits_total,
            fallback_transitions_total,
            connection_status,
        })
    }

    /// Record one completed fetch.
    pub fn record_snapshot(&self, snapshot: &MarketSnapshot) {
        let data_type = snapshot.payload.data_type().action();
        let source = snapshot.source.to_string();
        self.fetches_total
            .with_label_values(&[data_type, &source])
            .inc();

        if snapshot.source == DataSource::Cached {
            self.cache_hits_total.with_label_values(&[data_type]).inc();
        }
    }

    /// Record a status change, counting entries into fallback.
    pub fn record_status(&self, status: ConnectionStatus) {
        let code = status_code(status);
        if code == 2 && self.connection_status.get() != 2 {
            self.fallback_transitions_total.inc();
        }
        self.connection_status.set(code);
    }

    /// Observe a poller's snapshot and status channels until shutdown.
    #[instrument(skip_all)]
    pub async fn observe(
        self: Arc<Self>,
        mut snapshot_rx: broadcast::Receiver<MarketSnapshot>,
        mut status_rx: watch::Receiver<ConnectionStatus>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Metrics observer shutting down");
                    return;
                }
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let status = *status_rx.borrow_and_update();
                    self.record_status(status);
                }
                snapshot = snapshot_rx.recv() => {
                    match snapshot {
                        Ok(s) => self.record_snapshot(&s),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        }
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let registry = metrics_self.registry.clone();
                async move {
                    let encoder = TextEncoder::new();
                    let metric_families = registry.gather();
                    let mut buffer = Vec::new();
                    if encoder.encode(&metric_families, &mut buffer).is_err() {
                        return String::new();
                    }
                    String::from_utf8(buffer).unwrap_or_default()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{MarketPayload, PricePayload};
    use chrono::Utc;

    fn price_snapshot(source: DataSource) -> MarketSnapshot {
        MarketSnapshot {
            success: source != DataSource::Fallback,
            source,
            payload: MarketPayload::Price(PricePayload {
                current_price: 40.0,
                average_price: 45.0,
            }),
            timestamp: Utc::now(),
            error: None,
        }
    }

    #[test]
    fn test_cached_snapshot_counts_as_cache_hit() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_snapshot(&price_snapshot(DataSource::Cached));
        metrics.record_snapshot(&price_snapshot(DataSource::Live));

        let hits = metrics.cache_hits_total.with_label_values(&["price"]).get();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_fallback_transition_counted_once() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.record_status(ConnectionStatus::Connected);
        metrics.record_status(ConnectionStatus::Fallback);
        metrics.record_status(ConnectionStatus::Fallback);
        metrics.record_status(ConnectionStatus::Connected);
        metrics.record_status(ConnectionStatus::Fallback);

        assert_eq!(metrics.fallback_transitions_total.get(), 2);
        assert_eq!(metrics.connection_status.get(), 2);
    }
}
