//! Gridpulse - Entry Point
//!
//! Initializes configuration, logging, the gateway client, and the
//! market data poll loop. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create HttpGateway (HTTP + retry + concurrency cap)
//! 4. Create MarketDataPoller (cache + fallback + status machine)
//! 5. Spawn health server (/live + /ready, readiness follows status)
//! 6. Spawn metrics server + observer (/metrics)
//! 7. Start PollScheduler (immediate refetch, then fixed interval)
//! 8. Wait for SIGINT/SIGTERM → graceful shutdown (unready→stop loop→exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::gateway::{HttpGateway, HttpGatewayConfig};
use adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use adapters::notify::LogNotifier;
use domain::market_data::DataType;
use usecases::{MarketDataPoller, PollScheduler, PollerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        gateway = %config.gateway.base_url,
        "Starting gridpulse"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Create gateway client ────────────────────────────
    let gateway_config = HttpGatewayConfig {
        base_url: config.gateway.base_url.clone(),
        function_name: config.gateway.function_name.clone(),
        timeout: Duration::from_millis(config.gateway.timeout_ms),
        max_concurrent: config.gateway.max_concurrent,
        max_retries: config.gateway.max_retries,
        retry_base_delay: Duration::from_millis(config.gateway.retry_base_delay_ms),
    };
    let gateway = Arc::new(
        HttpGateway::new(gateway_config).context("Failed to create gateway client")?,
    );

    // ── 5. Create poller (validated actions → data types) ───
    let data_types: Vec<DataType> = config
        .poller
        .data_types
        .iter()
        .filter_map(|action| DataType::from_action(action))
        .collect();

    let poller_config = PollerConfig {
        ttl: Duration::from_secs(config.poller.ttl_seconds),
        data_types,
    };
    let poller = Arc::new(MarketDataPoller::new(
        Arc::clone(&gateway),
        Arc::new(LogNotifier::new()),
        poller_config,
    ));

    // ── 6. Spawn health server ──────────────────────────────
    let health_state = HealthState::new(poller.watch_status());
    let health_server = HealthServer::new(health_state.clone(), config.metrics.health_port);
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    // ── 7. Spawn metrics server + observer ──────────────────
    let mut metrics_handles = Vec::new();
    if config.metrics.enabled {
        let registry = Arc::new(MetricsRegistry::new().context("Failed to build metrics")?);

        let observer = Arc::clone(&registry);
        let snapshot_rx = poller.subscribe();
        let status_rx = poller.watch_status();
        let observer_shutdown = shutdown_tx.subscribe();
        metrics_handles.push(tokio::spawn(async move {
            observer.observe(snapshot_rx, status_rx, observer_shutdown).await;
        }));

        let bind_address = config.metrics.bind_address.clone();
        let serve_shutdown = shutdown_tx.subscribe();
        metrics_handles.push(tokio::spawn(async move {
            if let Err(e) = registry.serve(bind_address, serve_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }));
    }

    // ── 8. Start the poll loop ──────────────────────────────
    let scheduler = PollScheduler::new(
        Arc::clone(&poller),
        Duration::from_secs(config.poller.poll_interval_seconds),
    );
    let poll_handle = scheduler.start();

    info!("All tasks spawned — gridpulse is running");

    // ── 9. Wait for SIGINT / SIGTERM ────────────────────────
    wait_for_shutdown_signal().await;
    info!("Shutdown signal received, initiating graceful shutdown");

    // ── Graceful shutdown (unready → stop loop → exit) ──────

    // 1. Mark readiness probe unready (503)
    health_state.mark_shutting_down();

    // 2. Stop the poll loop via its explicit handle
    poll_handle.stop().await;

    // 3. Signal remaining tasks to stop
    let _ = shutdown_tx.send(());

    // 4. Wait for servers to drain (up to 5s each)
    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;
    for handle in metrics_handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolve on SIGINT, or on SIGTERM where available.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
