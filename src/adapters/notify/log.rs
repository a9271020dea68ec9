//! Log Notifier - Tracing-backed Degradation Advisories
//!
//! The default `StatusNotifier`: a structured warn line on the first
//! fallback transition, an info line on recovery. Deployments that want
//! toasts or webhooks swap this adapter out behind the same port.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::market_data::DataType;
use crate::ports::notifier::StatusNotifier;

/// Notifier that writes advisories to the structured log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a new log notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatusNotifier for LogNotifier {
    async fn notify_degraded(&self, data_type: DataType, reason: &str) {
        warn!(
            data_type = %data_type,
            reason = %reason,
            "Live market data unavailable, serving estimated values"
        );
    }

    async fn notify_recovered(&self, data_type: DataType) {
        info!(data_type = %data_type, "Live market data connection restored");
    }
}
