//! Status Notifier Port - Degraded-Mode Advisory Interface
//!
//! The poller emits exactly one advisory when it first enters fallback
//! mode, and one when it recovers. This seam exists so those exactly-once
//! semantics are testable and so the advisory channel (log line, toast,
//! webhook) is an adapter concern.

use async_trait::async_trait;

use crate::domain::market_data::DataType;

/// Trait for user-facing degradation advisories.
#[async_trait]
pub trait StatusNotifier: Send + Sync + 'static {
  /// Fired once on the first transition into fallback mode.
  ///
  /// Suppressed on subsequent consecutive failures; fires again only
  /// after a recovery.
  async fn notify_degraded(&self, data_type: DataType, reason: &str);

  /// Fired when live data returns after a fallback period.
  async fn notify_recovered(&self, data_type: DataType);
}
