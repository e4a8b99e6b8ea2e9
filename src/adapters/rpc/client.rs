//! JSON-RPC HTTP Client - Rate-limited Ledger RPC Client
//!
//! Wraps reqwest with a concurrency limit, request timeout and
//! exponential-backoff retries for JSON-RPC 2.0 calls against a
//! ledger full node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::types::{JsonRpcRequest, JsonRpcResponse};

/// Configuration for the JSON-RPC client.
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
  /// Full node RPC endpoint.
  pub url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
}

impl Default for RpcClientConfig {
  fn default() -> Self {
    Self {
      url: "https://fullnode.testnet.sui.io:443".to_string(),
      timeout: Duration::from_secs(10),
      max_concurrent: 16,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
    }
  }
}

/// Rate-limited JSON-RPC 2.0 client.
pub struct RpcClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: RpcClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Monotonic request id.
  next_id: AtomicU64,
}

impl RpcClient {
  /// Create a new RPC client.
  pub fn new(config: RpcClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(config.max_concurrent)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

    Ok(Self {
      http,
      config,
      semaphore,
      next_id: AtomicU64::new(1),
    })
  }

  /// Endpoint this client talks to.
  pub fn url(&self) -> &str {
    &self.config.url
  }

  /// Call `method` and decode its `result`.
  ///
  /// Transport errors, HTTP 429 and 5xx are retried; JSON-RPC error
  /// objects are returned as-is.
  pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .context("Semaphore closed")?;

    let request = JsonRpcRequest {
      jsonrpc: "2.0",
      id: self.next_id.fetch_add(1, Ordering::Relaxed),
      method,
      params,
    };

    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(method, attempt, delay_ms = delay.as_millis(), "Retrying RPC call");
        sleep(delay).await;
      }

      match self.http.post(&self.config.url).json(&request).send().await {
        Ok(response) => match response.status() {
          StatusCode::OK => {
            let envelope: JsonRpcResponse<T> = response
              .json()
              .await
              .with_context(|| format!("Failed to decode {method} response"))?;
            if let Some(err) = envelope.error {
              anyhow::bail!("RPC error {} from {method}: {}", err.code, err.message);
            }
            return envelope
              .result
              .with_context(|| format!("{method} returned neither result nor error"));
          }
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(method, attempt, "Rate limited by RPC node, backing off");
            last_error = Some(anyhow::anyhow!("Rate limited"));
          }
          status if status.is_server_error() => {
            warn!(method, status = %status, attempt, "Server error, retrying");
            last_error = Some(anyhow::anyhow!("Server error: {status}"));
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("RPC HTTP error {status}: {body}");
          }
        },
        Err(e) => {
          warn!(method, error = %e, attempt, "RPC request failed");
          last_error = Some(e.into());
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Max retries exceeded")))
  }

  /// Check if the node answers.
  pub async fn health_check(&self) -> bool {
    self
      .call::<Value>("sui_getChainIdentifier", Value::Array(Vec::new()))
      .await
      .is_ok()
  }
}
