//! Market Data Poller - Cache, Fallback, and Status Orchestration
//!
//! The central use case: fetch a data type through the gateway port,
//! serve fresh cache entries without a remote call, substitute synthetic
//! values on any failure, and track a coarse connection status.
//!
//! Failure semantics: no error escapes this component. Every failure path
//! terminates in a valid, shaped snapshot tagged `fallback`. The only
//! user-visible escalation is a one-time degraded advisory through the
//! `StatusNotifier` port, re-armed after each recovery.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::market_data::{
  CacheKey, ConnectionStatus, DataType, GenerationPayload, LoadPayload,
  MarketPayload, MarketSnapshot, PricePayload,
};
use crate::domain::synthesizer;
use crate::ports::gateway::{GatewayRequest, MarketGateway};
use crate::ports::notifier::StatusNotifier;

/// Per-instance poller tuning.
#[derive(Debug, Clone)]
pub struct PollerConfig {
  /// How long a live cache entry stays fresh.
  pub ttl: Duration,
  /// Data types this instance tracks (drives `refetch_all`).
  pub data_types: Vec<DataType>,
}

impl Default for PollerConfig {
  fn default() -> Self {
    Self {
      ttl: Duration::from_secs(75),
      data_types: DataType::ALL.to_vec(),
    }
  }
}

/// A cached live snapshot. Only live responses are ever stored, so a
/// synthetic value can never be re-served as if it were real.
struct CacheEntry {
  snapshot: MarketSnapshot,
  stored_at: Instant,
}

/// Orchestrates gateway calls, TTL caching, and fallback substitution.
///
/// All mutable state is owned by the instance. Multiple pollers do not
/// share caches or status. Single-threaded interleaving of async calls is
/// the only concurrency; duplicate in-flight fetches for the same key are
/// not coalesced and will each issue a gateway call.
pub struct MarketDataPoller<G: MarketGateway, N: StatusNotifier> {
  /// Gateway invocation port.
  gateway: Arc<G>,
  /// Degraded-mode advisory port.
  notifier: Arc<N>,
  /// Instance tuning.
  config: PollerConfig,
  /// TTL cache keyed by (data type, params). Lazy expiry at read time.
  cache: RwLock<HashMap<CacheKey, CacheEntry>>,
  /// Last snapshot returned per data type, for `get_current`.
  latest: RwLock<HashMap<DataType, MarketSnapshot>>,
  /// Connection status, observable by health probes and consumers.
  status_tx: watch::Sender<ConnectionStatus>,
  /// Every returned snapshot, for presentation/metrics consumers.
  snapshot_tx: broadcast::Sender<MarketSnapshot>,
  /// Whether the degraded advisory has fired for the current outage.
  degraded_notified: AtomicBool,
}

impl<G: MarketGateway, N: StatusNotifier> MarketDataPoller<G, N> {
  /// Create a poller in the `Connecting` state.
  ///
  /// No fetch is issued here; the scheduler's `start()` drives the
  /// initial `refetch_all` so the create → start → stop lifecycle stays
  /// explicit.
  pub fn new(gateway: Arc<G>, notifier: Arc<N>, config: PollerConfig) -> Self {
    let (status_tx, _) = watch::channel(ConnectionStatus::Connecting);
    let (snapshot_tx, _) = broadcast::channel(64);

    Self {
      gateway,
      notifier,
      config,
      cache: RwLock::new(HashMap::new()),
      latest: RwLock::new(HashMap::new()),
      status_tx,
      snapshot_tx,
      degraded_notified: AtomicBool::new(false),
    }
  }

  /// Fetch one data type, resolving to a snapshot in every case.
  ///
  /// Strict sequence: cache check, then (on miss) gateway call, then
  /// cache write and status update, then return. A fresh cache entry is
  /// served with provenance `cached`, identical payload and timestamp,
  /// and no gateway call.
  #[instrument(skip(self, params), fields(data_type = %data_type))]
  pub async fn fetch(
    &self,
    data_type: DataType,
    params: BTreeMap<String, String>,
  ) -> MarketSnapshot {
    let request = GatewayRequest::with_params(data_type, params);
    let key = request.cache_key();

    if let Some(snapshot) = self.cache_lookup(&key).await {
      debug!(key = %key, "Cache hit, serving without gateway call");
      self.remember(data_type, &snapshot).await;
      return snapshot;
    }

    match self.gateway.invoke(&request).await {
      Ok(reply) if reply.is_live() => {
        match decode_payload(data_type, &reply.data) {
          Ok(payload) => {
            let timestamp = reply.timestamp.unwrap_or_else(Utc::now);
            let snapshot = MarketSnapshot::live(payload, timestamp);
            self.cache_store(key, &snapshot).await;
            self.mark_connected(data_type).await;
            self.remember(data_type, &snapshot).await;
            snapshot
          }
          Err(e) => {
            self
              .enter_fallback(data_type, format!("undecodable payload: {e}"))
              .await
          }
        }
      }
      Ok(reply) => {
        let reason = reply
          .error
          .unwrap_or_else(|| "gateway reported degraded status".to_string());
        self.enter_fallback(data_type, reason).await
      }
      Err(e) => self.enter_fallback(data_type, e.to_string()).await,
    }
  }

  /// Last snapshot returned by `fetch` for this type, without any request.
  ///
  /// `None` means no data yet, not an error.
  pub async fn get_current(&self, data_type: DataType) -> Option<MarketSnapshot> {
    self.latest.read().await.get(&data_type).cloned()
  }

  /// Re-fetch every configured data type concurrently.
  ///
  /// Outcomes are independent: one data type falling back does not block
  /// or fail the others. Idempotent when the gateway is healthy.
  pub async fn refetch_all(&self) -> Vec<MarketSnapshot> {
    join_all(
      self
        .config
        .data_types
        .iter()
        .map(|&dt| self.fetch(dt, BTreeMap::new())),
    )
    .await
  }

  /// Current connection status.
  pub fn status(&self) -> ConnectionStatus {
    *self.status_tx.borrow()
  }

  /// Subscribe to connection status changes.
  pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
    self.status_tx.subscribe()
  }

  /// Subscribe to every snapshot this poller returns.
  ///
  /// Used by presentation and metrics consumers; dropped receivers are
  /// harmless (lagging subscribers simply miss snapshots).
  pub fn subscribe(&self) -> broadcast::Receiver<MarketSnapshot> {
    self.snapshot_tx.subscribe()
  }

  /// Data types this instance tracks.
  pub fn data_types(&self) -> &[DataType] {
    &self.config.data_types
  }

  /// Look up a fresh cache entry. Expired entries are treated as absent
  /// and left in place to be overwritten by the next live write.
  async fn cache_lookup(&self, key: &CacheKey) -> Option<MarketSnapshot> {
    let cache = self.cache.read().await;
    let entry = cache.get(key)?;
    if entry.stored_at.elapsed() < self.config.ttl {
      Some(entry.snapshot.as_cached())
    } else {
      None
    }
  }

  /// Store a live snapshot, overwriting any stale entry for the key.
  async fn cache_store(&self, key: CacheKey, snapshot: &MarketSnapshot) {
    let mut cache = self.cache.write().await;
    cache.insert(
      key,
      CacheEntry {
        snapshot: snapshot.clone(),
        stored_at: Instant::now(),
      },
    );
  }

  /// Record the value returned to the caller for `get_current` and
  /// publish it to subscribers.
  async fn remember(&self, data_type: DataType, snapshot: &MarketSnapshot) {
    self.latest.write().await.insert(data_type, snapshot.clone());
    let _ = self.snapshot_tx.send(snapshot.clone());
  }

  /// Flip status to connected and re-arm the degraded advisory.
  async fn mark_connected(&self, data_type: DataType) {
    let previous = *self.status_tx.borrow();
    self.status_tx.send_replace(ConnectionStatus::Connected);

    if self.degraded_notified.swap(false, Ordering::SeqCst) {
      info!(data_type = %data_type, "Live data restored after fallback");
      self.notifier.notify_recovered(data_type).await;
    } else if previous == ConnectionStatus::Connecting {
      info!(data_type = %data_type, "First live fetch succeeded");
    }
  }

  /// Substitute a synthetic snapshot and flip status to fallback.
  ///
  /// The degraded advisory fires only on the first transition into
  /// fallback; consecutive failures stay silent until recovery.
  async fn enter_fallback(&self, data_type: DataType, reason: String) -> MarketSnapshot {
    warn!(data_type = %data_type, reason = %reason, "Falling back to synthetic data");

    self.status_tx.send_replace(ConnectionStatus::Fallback);

    if !self.degraded_notified.swap(true, Ordering::SeqCst) {
      self.notifier.notify_degraded(data_type, &reason).await;
    }

    let payload = synthesizer::synthesize(data_type, Utc::now());
    let snapshot = MarketSnapshot::fallback(payload, Utc::now(), reason);
    self.remember(data_type, &snapshot).await;
    snapshot
  }
}

/// Decode the gateway's untyped `data` object into the payload variant
/// matching the requested data type.
fn decode_payload(data_type: DataType, data: &Value) -> Result<MarketPayload, serde_json::Error> {
  match data_type {
    DataType::PoolPrice => {
      serde_json::from_value::<PricePayload>(data.clone()).map(MarketPayload::Price)
    }
    DataType::LoadForecast => {
      serde_json::from_value::<LoadPayload>(data.clone()).map(MarketPayload::Load)
    }
    DataType::GenerationMix => {
      serde_json::from_value::<GenerationPayload>(data.clone()).map(MarketPayload::Generation)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_decode_price_payload() {
    let data = json!({"current_price": 48.2, "average_price": 55.1});
    let payload = decode_payload(DataType::PoolPrice, &data).unwrap();
    assert_eq!(
      payload,
      MarketPayload::Price(PricePayload {
        current_price: 48.2,
        average_price: 55.1,
      })
    );
  }

  #[test]
  fn test_decode_rejects_wrong_shape() {
    let data = json!({"current_price": 48.2});
    assert!(decode_payload(DataType::LoadForecast, &data).is_err());
  }

  #[test]
  fn test_decode_generation_payload() {
    let data = json!({
      "gas_mw": 5000.0,
      "wind_mw": 2000.0,
      "solar_mw": 500.0,
      "hydro_mw": 300.0,
      "other_mw": 200.0,
      "renewable_pct": 35.0
    });
    let payload = decode_payload(DataType::GenerationMix, &data).unwrap();
    assert_eq!(payload.data_type(), DataType::GenerationMix);
  }
}
