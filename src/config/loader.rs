//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::market_data::DataType;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    name = %config.service.name,
    data_types = config.poller.data_types.len(),
    ttl_secs = config.poller.ttl_seconds,
    interval_secs = config.poller.poll_interval_seconds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty gateway endpoint
/// - TTL and poll interval within sane operating ranges
/// - Recognized data type action strings
fn validate_config(config: &AppConfig) -> Result<()> {
  // Gateway validation
  anyhow::ensure!(
    !config.gateway.base_url.is_empty(),
    "Gateway base_url must not be empty"
  );
  anyhow::ensure!(
    !config.gateway.function_name.is_empty(),
    "Gateway function_name must not be empty"
  );
  anyhow::ensure!(
    config.gateway.timeout_ms > 0 && config.gateway.timeout_ms <= 120_000,
    "Gateway timeout_ms must be in (0, 120000], got {}",
    config.gateway.timeout_ms
  );
  anyhow::ensure!(
    config.gateway.max_concurrent > 0,
    "Gateway max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.gateway.max_retries <= 10,
    "Gateway max_retries must be <= 10, got {}",
    config.gateway.max_retries
  );

  // Poller validation
  anyhow::ensure!(
    config.poller.ttl_seconds > 0 && config.poller.ttl_seconds <= 600,
    "Poller ttl_seconds must be in (0, 600], got {}",
    config.poller.ttl_seconds
  );
  anyhow::ensure!(
    config.poller.poll_interval_seconds >= 30,
    "Poller poll_interval_seconds must be >= 30, got {}",
    config.poller.poll_interval_seconds
  );
  anyhow::ensure!(
    !config.poller.data_types.is_empty(),
    "At least one data type must be configured"
  );

  for (i, action) in config.poller.data_types.iter().enumerate() {
    anyhow::ensure!(
      DataType::from_action(action).is_some(),
      "Data type {} (\"{}\") is not recognized",
      i,
      action
    );
  }

  // Metrics validation
  anyhow::ensure!(
    !config.metrics.bind_address.is_empty(),
    "Metrics bind_address must not be empty"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const VALID_CONFIG: &str = r#"
[service]
name = "gridpulse-test"

[gateway]
base_url = "http://localhost:54321"

[poller]
ttl_seconds = 75
poll_interval_seconds = 300
data_types = ["price", "load"]

[metrics]
"#;

  fn write_temp_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
  }

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_load_valid_config() {
    let file = write_temp_config(VALID_CONFIG);
    let config = load_config(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.service.name, "gridpulse-test");
    assert_eq!(config.poller.data_types.len(), 2);
    assert_eq!(config.gateway.function_name, "market-data");
  }

  #[test]
  fn test_rejects_unrecognized_data_type() {
    let file = write_temp_config(&VALID_CONFIG.replace("\"load\"", "\"weather\""));
    let result = load_config(file.path().to_str().unwrap());
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("not recognized"));
  }

  #[test]
  fn test_rejects_zero_ttl() {
    let file = write_temp_config(&VALID_CONFIG.replace("ttl_seconds = 75", "ttl_seconds = 0"));
    assert!(load_config(file.path().to_str().unwrap()).is_err());
  }

  #[test]
  fn test_rejects_too_frequent_polling() {
    let file = write_temp_config(
      &VALID_CONFIG.replace("poll_interval_seconds = 300", "poll_interval_seconds = 5"),
    );
    assert!(load_config(file.path().to_str().unwrap()).is_err());
  }
}
