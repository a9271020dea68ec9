//! Market Gateway Port - Remote Function Invocation Interface
//!
//! Defines the trait for invoking the serverless function gateway that
//! fronts the upstream market data sources. The invocation layer returns
//! either a decoded reply or a typed error; the semantic success check
//! (`success`/`source` fields inside the reply) is the poller's job.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::market_data::{CacheKey, DataType};

/// A single gateway invocation request. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
  /// Which data category to fetch.
  pub data_type: DataType,
  /// Optional request parameters, sorted for deterministic cache keys.
  pub params: BTreeMap<String, String>,
}

impl GatewayRequest {
  /// Request with no parameters.
  pub fn new(data_type: DataType) -> Self {
    Self {
      data_type,
      params: BTreeMap::new(),
    }
  }

  /// Request with parameters.
  pub fn with_params(data_type: DataType, params: BTreeMap<String, String>) -> Self {
    Self { data_type, params }
  }

  /// Cache key derived from the data type and sorted parameters.
  pub fn cache_key(&self) -> CacheKey {
    let mut key = self.data_type.action().to_string();
    for (k, v) in &self.params {
      key.push_str(&format!("&{k}={v}"));
    }
    key
  }
}

/// Decoded gateway reply body.
///
/// Wire shape: `{success, source, data, error?, timestamp}`. The `data`
/// object is left untyped here; the poller decodes it into the payload
/// variant matching the requested data type.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayReply {
  /// Whether the gateway considers the fetch successful.
  #[serde(default = "default_true")]
  pub success: bool,
  /// Provenance reported by the gateway ("live", "fallback", ...).
  #[serde(default)]
  pub source: Option<String>,
  /// Untyped payload object.
  #[serde(default)]
  pub data: serde_json::Value,
  /// Error message on semantic failure.
  #[serde(default)]
  pub error: Option<String>,
  /// Server-side timestamp of the reading.
  #[serde(default)]
  pub timestamp: Option<DateTime<Utc>>,
}

impl GatewayReply {
  /// True only for a genuinely live reading: no error, success not
  /// explicitly false, and the gateway itself not in degraded mode.
  pub fn is_live(&self) -> bool {
    self.error.is_none()
      && self.success
      && self.source.as_deref() != Some("fallback")
  }
}

fn default_true() -> bool {
  true
}

/// Failure taxonomy for gateway invocations.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// Gateway unreachable or the request itself failed.
  #[error("transport failure: {0}")]
  Transport(String),
  /// Gateway reachable but answered with a non-success HTTP status.
  #[error("gateway returned HTTP {status}")]
  Status { status: u16 },
  /// Reply body could not be decoded.
  #[error("failed to decode gateway reply: {0}")]
  Decode(String),
  /// Invocation layer reported an error envelope instead of data.
  #[error("gateway error: {0}")]
  Remote(String),
}

/// Trait for gateway invocation providers.
///
/// Implementors own transport concerns (timeouts, retries, backoff).
/// Every error is recovered by the poller via synthetic substitution,
/// so no `GatewayError` ever propagates past the usecases layer.
#[async_trait]
pub trait MarketGateway: Send + Sync + 'static {
  /// Invoke the gateway function for one request.
  async fn invoke(&self, request: &GatewayRequest) -> Result<GatewayReply, GatewayError>;

  /// Check if the gateway endpoint is reachable.
  async fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_key_includes_sorted_params() {
    let mut params = BTreeMap::new();
    params.insert("zone".to_string(), "south".to_string());
    params.insert("hours".to_string(), "24".to_string());
    let req = GatewayRequest::with_params(DataType::LoadForecast, params);
    assert_eq!(req.cache_key(), "load&hours=24&zone=south");
  }

  #[test]
  fn test_cache_key_without_params() {
    let req = GatewayRequest::new(DataType::PoolPrice);
    assert_eq!(req.cache_key(), "price");
  }

  #[test]
  fn test_reply_is_live() {
    let live: GatewayReply = serde_json::from_value(serde_json::json!({
      "success": true,
      "source": "live",
      "data": {"current_price": 45.0, "average_price": 50.0},
      "timestamp": "2026-01-15T12:00:00Z"
    }))
    .unwrap();
    assert!(live.is_live());

    let degraded: GatewayReply = serde_json::from_value(serde_json::json!({
      "success": true,
      "source": "fallback",
      "data": {}
    }))
    .unwrap();
    assert!(!degraded.is_live());

    let failed: GatewayReply = serde_json::from_value(serde_json::json!({
      "success": false,
      "error": "rate limited",
      "data": {}
    }))
    .unwrap();
    assert!(!failed.is_live());
  }
}
