//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`, with the
//! `STATE_RPC_URL` environment variable overriding the RPC endpoint.
//! Every tunable of the pricing core is externalized here; nothing is
//! hardcoded in the use cases.

pub mod loader;

use serde::{Deserialize, Deserializer};

use crate::domain::quote::DEFAULT_SLIPPAGE;
use crate::domain::solver::SolverConfig;
use crate::domain::trade::OpenPosition;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the service begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and metadata.
  pub service: ServiceConfig,
  /// Where market state is read from.
  pub state_source: StateSourceConfig,
  /// Amount → shares solver tunables.
  #[serde(default)]
  pub solver: SolverConfig,
  /// Quote façade parameters.
  #[serde(default)]
  pub quotes: QuotesConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Persistence configuration.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Portfolio monitor loop.
  #[serde(default)]
  pub monitor: MonitorConfig,
  /// Open positions tracked by the monitor.
  #[serde(default, deserialize_with = "deserialize_positions")]
  pub positions: Vec<OpenPosition>,
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

/// Kind of state source backing the quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSourceKind {
  /// Ledger full node over JSON-RPC.
  Rpc,
  /// Local JSON snapshot file.
  Snapshot,
}

/// State source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StateSourceConfig {
  pub kind: StateSourceKind,
  /// Ledger JSON-RPC endpoint (kind = "rpc").
  #[serde(default)]
  pub rpc_url: String,
  /// Snapshot file path (kind = "snapshot").
  #[serde(default = "default_snapshot_path")]
  pub snapshot_path: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum concurrent RPC requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
}

/// Quote façade configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesConfig {
  /// Slippage applied when a caller passes none (fraction, 0.05 = 5%).
  #[serde(default = "default_slippage")]
  pub default_slippage: f64,
  /// Parallel table-entry reads per market state read.
  #[serde(default = "default_max_concurrent_reads")]
  pub max_concurrent_reads: usize,
  /// Positions priced in parallel by the total PnL sweep.
  #[serde(default = "default_pnl_concurrency")]
  pub pnl_concurrency: usize,
}

impl Default for QuotesConfig {
  fn default() -> Self {
    Self {
      default_slippage: default_slippage(),
      max_concurrent_reads: default_max_concurrent_reads(),
      pnl_concurrency: default_pnl_concurrency(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable the health/metrics server.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Health/metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for JSONL trade logs.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

/// Portfolio monitor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
  /// Seconds between PnL sweeps.
  #[serde(default = "default_monitor_interval")]
  pub interval_seconds: u64,
}

impl Default for MonitorConfig {
  fn default() -> Self {
    Self {
      interval_seconds: default_monitor_interval(),
    }
  }
}

/// `[[positions]]` entry. TOML integers are 64-bit, so amounts are read
/// as `u64` and widened.
#[derive(Debug, Deserialize)]
struct PositionEntry {
  market_id: String,
  range_start: i64,
  range_end: i64,
  shares: u64,
  cost_basis: u64,
}

fn deserialize_positions<'de, D>(deserializer: D) -> Result<Vec<OpenPosition>, D::Error>
where
  D: Deserializer<'de>,
{
  let entries = Vec::<PositionEntry>::deserialize(deserializer)?;
  Ok(
    entries
      .into_iter()
      .map(|e| OpenPosition {
        market_id: e.market_id,
        range_start: e.range_start,
        range_end: e.range_end,
        shares: u128::from(e.shares),
        cost_basis: u128::from(e.cost_basis),
      })
      .collect(),
  )
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_snapshot_path() -> String {
  "data/markets.json".to_string()
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_max_concurrent() -> usize {
  16
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_base_delay_ms() -> u64 {
  200
}

fn default_slippage() -> f64 {
  DEFAULT_SLIPPAGE
}

fn default_max_concurrent_reads() -> usize {
  16
}

fn default_pnl_concurrency() -> usize {
  4
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_monitor_interval() -> u64 {
  60
}
