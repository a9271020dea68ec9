//! HTTP Gateway Client - Serverless Function Invocation over REST
//!
//! Wraps reqwest with a concurrency cap, bounded retries, and backoff
//! for all gateway invocations. POSTs `{action, ...params}` to the
//! configured function endpoint and decodes the `{data, error}` envelope.
//!
//! Retries here are transport-level only; semantic failures inside a
//! decoded reply (success=false, degraded source) are the poller's
//! concern and are returned as-is.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::ports::gateway::{GatewayError, GatewayReply, GatewayRequest, MarketGateway};

/// Configuration for the HTTP gateway client.
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
  /// Base URL of the function host.
  pub base_url: String,
  /// Function name appended to `/functions/v1/`.
  pub function_name: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for HttpGatewayConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:54321".to_string(),
      function_name: "market-data".to_string(),
      timeout: Duration::from_secs(15),
      max_concurrent: 8,
      max_retries: 2,
      retry_base_delay: Duration::from_millis(200),
    }
  }
}

/// Outer invocation envelope: either data or an error, never both.
#[derive(Debug, Deserialize)]
struct Envelope {
  #[serde(default)]
  data: Option<GatewayReply>,
  #[serde(default)]
  error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
  message: String,
}

/// Rate-capped HTTP client for the market data function gateway.
pub struct HttpGateway {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: HttpGatewayConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
}

impl HttpGateway {
  /// Create a new gateway client.
  pub fn new(config: HttpGatewayConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(4)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

    Ok(Self {
      http,
      config,
      semaphore,
    })
  }

  /// Wire body for a request: `{action, ...params}`.
  fn request_body(request: &GatewayRequest) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(
      "action".to_string(),
      Value::String(request.data_type.action().to_string()),
    );
    for (k, v) in &request.params {
      body.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(body)
  }

  fn endpoint(&self) -> String {
    format!(
      "{}/functions/v1/{}",
      self.config.base_url, self.config.function_name
    )
  }

  /// Execute the POST with concurrency cap, retries, and backoff.
  async fn post_with_retry(&self, body: &Value) -> Result<GatewayReply, GatewayError> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| GatewayError::Transport("semaphore closed".to_string()))?;

    let url = self.endpoint();
    let mut last_error = GatewayError::Transport("no attempt made".to_string());

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying gateway request");
        sleep(delay).await;
      }

      let sent = self.http.post(&url).json(body).send().await;

      match sent {
        Ok(response) => match response.status() {
          StatusCode::OK | StatusCode::CREATED => {
            let envelope: Envelope = response
              .json()
              .await
              .map_err(|e| GatewayError::Decode(e.to_string()))?;

            if let Some(err) = envelope.error {
              return Err(GatewayError::Remote(err.message));
            }
            return envelope
              .data
              .ok_or_else(|| GatewayError::Decode("envelope missing data".to_string()));
          }
          StatusCode::TOO_MANY_REQUESTS => {
            warn!("Rate limited by gateway, backing off");
            sleep(Duration::from_secs(2)).await;
            last_error = GatewayError::Status { status: 429 };
            continue;
          }
          status if status.is_server_error() => {
            warn!(status = %status, "Gateway server error, retrying");
            last_error = GatewayError::Status {
              status: status.as_u16(),
            };
            continue;
          }
          status => {
            return Err(GatewayError::Status {
              status: status.as_u16(),
            });
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, "Gateway request failed");
          last_error = GatewayError::Transport(e.to_string());
          continue;
        }
      }
    }

    Err(last_error)
  }
}

#[async_trait]
impl MarketGateway for HttpGateway {
  async fn invoke(&self, request: &GatewayRequest) -> Result<GatewayReply, GatewayError> {
    let body = Self::request_body(request);
    self.post_with_retry(&body).await
  }

  async fn is_healthy(&self) -> bool {
    match self.http.get(&self.config.base_url).send().await {
      Ok(response) => !response.status().is_server_error(),
      Err(_) => false,
    }
  }
}
