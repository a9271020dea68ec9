//! Poll Scheduler - Periodic Refetch with an Explicit Lifecycle
//!
//! Drives the poller on a fixed interval. The periodic work is modeled
//! as a cancellable handle: `start()` spawns the loop and returns a
//! `PollHandle`, and callers must invoke the paired `stop()` on teardown
//! so no interval outlives its consumer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::domain::market_data::DataSource;
use crate::ports::gateway::MarketGateway;
use crate::ports::notifier::StatusNotifier;

use super::poller::MarketDataPoller;

/// Periodic re-poll driver for one poller instance.
pub struct PollScheduler<G: MarketGateway, N: StatusNotifier> {
  /// The poller being driven.
  poller: Arc<MarketDataPoller<G, N>>,
  /// Interval between full refetch cycles.
  interval: Duration,
}

/// Cancellable handle to a running poll loop.
///
/// Dropping the handle without calling `stop()` leaves the loop running
/// until the process exits; `stop()` is the supported teardown path.
pub struct PollHandle {
  shutdown_tx: broadcast::Sender<()>,
  task: JoinHandle<()>,
}

impl PollHandle {
  /// Signal the loop to stop and wait briefly for it to finish.
  pub async fn stop(self) {
    let _ = self.shutdown_tx.send(());
    if tokio::time::timeout(Duration::from_secs(5), self.task)
      .await
      .is_err()
    {
      warn!("Poll loop did not stop within 5s");
    }
  }
}

impl<G: MarketGateway, N: StatusNotifier> PollScheduler<G, N> {
  /// Create a scheduler for the given poller.
  pub fn new(poller: Arc<MarketDataPoller<G, N>>, interval: Duration) -> Self {
    Self { poller, interval }
  }

  /// Spawn the poll loop and return its handle.
  ///
  /// An immediate `refetch_all` runs before the first interval elapses,
  /// so consumers see data as soon as the gateway answers. Subsequent
  /// cycles fire once per interval regardless of whether prior calls
  /// completed (no coalescing, matching the poller's contract).
  #[instrument(skip(self), fields(interval_secs = self.interval.as_secs()))]
  pub fn start(self) -> PollHandle {
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let poller = self.poller;
    let interval = self.interval;

    let task = tokio::spawn(async move {
      info!(
        data_types = poller.data_types().len(),
        interval_secs = interval.as_secs(),
        "Poll loop started"
      );

      Self::run_cycle(&poller).await;

      loop {
        tokio::select! {
          biased;
          _ = shutdown_rx.recv() => {
            info!("Poll loop shutting down");
            return;
          }
          _ = tokio::time::sleep(interval) => {
            Self::run_cycle(&poller).await;
          }
        }
      }
    });

    PollHandle { shutdown_tx, task }
  }

  /// One full refetch cycle with a summary log line.
  async fn run_cycle(poller: &MarketDataPoller<G, N>) {
    let results = poller.refetch_all().await;
    let fallbacks = results
      .iter()
      .filter(|s| s.source == DataSource::Fallback)
      .count();

    if fallbacks > 0 {
      warn!(
        total = results.len(),
        fallbacks,
        status = ?poller.status(),
        "Poll cycle complete with degraded results"
      );
    } else {
      info!(
        total = results.len(),
        status = ?poller.status(),
        "Poll cycle complete"
      );
    }
  }
}
