//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Gateway
//! endpoints, TTL, and poll cadence are externalized here - nothing
//! is hardcoded in the domain layer. There is no runtime
//! reconfiguration: values are fixed per process.

pub mod loader;

use serde::Deserialize;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before polling begins.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// Function gateway endpoint and transport tuning.
  pub gateway: GatewayConfig,
  /// Poller cadence and cache freshness.
  pub poller: PollerSettings,
  /// Metrics and monitoring.
  pub metrics: MetricsConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Function gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  /// Base URL of the function host.
  pub base_url: String,
  /// Function name appended to the invocation path.
  #[serde(default = "default_function_name")]
  pub function_name: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum concurrent gateway requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Maximum transport-level retries per request.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries in milliseconds (exponential backoff).
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
}

/// Poller cadence and cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollerSettings {
  /// Cache TTL in seconds (live-market data stays fresh 60-90 s).
  #[serde(default = "default_ttl_seconds")]
  pub ttl_seconds: u64,
  /// Interval between full refetch cycles in seconds.
  #[serde(default = "default_poll_interval_seconds")]
  pub poll_interval_seconds: u64,
  /// Data types to track, by wire action string.
  #[serde(default = "default_data_types")]
  pub data_types: Vec<String>,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_function_name() -> String {
  "market-data".to_string()
}

fn default_timeout_ms() -> u64 {
  15_000
}

fn default_max_concurrent() -> usize {
  8
}

fn default_max_retries() -> u32 {
  2
}

fn default_retry_base_delay_ms() -> u64 {
  200
}

fn default_ttl_seconds() -> u64 {
  75
}

fn default_poll_interval_seconds() -> u64 {
  300
}

fn default_data_types() -> Vec<String> {
  vec![
    "price".to_string(),
    "load".to_string(),
    "generation".to_string(),
  ]
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
