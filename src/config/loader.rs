//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, applying environment overrides,
//! validating all parameters, and providing clear error messages for
//! misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, StateSourceKind};

/// Environment variable overriding `state_source.rpc_url`.
pub const RPC_URL_ENV: &str = "STATE_RPC_URL";

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;

  if let Ok(url) = std::env::var(RPC_URL_ENV) {
    if !url.is_empty() {
      config.state_source.rpc_url = url;
    }
  }

  validate_config(&config)?;

  info!(
    source = ?config.state_source.kind,
    positions = config.positions.len(),
    default_slippage = config.quotes.default_slippage,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).context("Failed to parse config.toml")
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A usable endpoint or path for the selected state source
/// - Positive concurrency limits and intervals
/// - Slippage within [0, 1]
/// - Well-formed positions
pub fn validate_config(config: &AppConfig) -> Result<()> {
  let source = &config.state_source;
  match source.kind {
    StateSourceKind::Rpc => anyhow::ensure!(
      !source.rpc_url.is_empty(),
      "state_source.rpc_url must be set for kind = \"rpc\" (or set {RPC_URL_ENV})"
    ),
    StateSourceKind::Snapshot => anyhow::ensure!(
      !source.snapshot_path.is_empty(),
      "state_source.snapshot_path must be set for kind = \"snapshot\""
    ),
  }
  anyhow::ensure!(source.timeout_ms > 0, "state_source.timeout_ms must be positive");
  anyhow::ensure!(
    source.max_concurrent > 0,
    "state_source.max_concurrent must be positive"
  );

  config
    .solver
    .validate()
    .context("Invalid [solver] section")?;

  let quotes = &config.quotes;
  anyhow::ensure!(
    quotes.default_slippage.is_finite() && (0.0..=1.0).contains(&quotes.default_slippage),
    "quotes.default_slippage must be in [0, 1], got {}",
    quotes.default_slippage
  );
  anyhow::ensure!(
    quotes.max_concurrent_reads > 0,
    "quotes.max_concurrent_reads must be positive"
  );
  anyhow::ensure!(
    quotes.pnl_concurrency > 0,
    "quotes.pnl_concurrency must be positive"
  );

  anyhow::ensure!(
    config.monitor.interval_seconds > 0,
    "monitor.interval_seconds must be positive"
  );

  for (i, position) in config.positions.iter().enumerate() {
    anyhow::ensure!(
      !position.market_id.is_empty(),
      "Position {i} has empty market_id"
    );
    anyhow::ensure!(
      position.range_start < position.range_end,
      "Position {i} ({}) has range_start {} >= range_end {}",
      position.market_id,
      position.range_start,
      position.range_end
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = r#"
    [service]
    name = "pricer"

    [state_source]
    kind = "snapshot"
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_takes_defaults() {
    let config = parse_config(MINIMAL).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.state_source.snapshot_path, "data/markets.json");
    assert_eq!(config.solver.max_iterations, 50);
    assert!((config.quotes.default_slippage - 0.05).abs() < f64::EPSILON);
    assert_eq!(config.monitor.interval_seconds, 60);
    assert!(config.positions.is_empty());
  }

  #[test]
  fn test_full_config() {
    let config = parse_config(
      r#"
      [service]
      name = "pricer"
      log_level = "debug"

      [state_source]
      kind = "rpc"
      rpc_url = "http://localhost:9000"
      max_retries = 5

      [solver]
      target_utilization = 0.98

      [quotes]
      default_slippage = 0.01
      pnl_concurrency = 8

      [[positions]]
      market_id = "0xabc"
      range_start = 100
      range_end = 200
      shares = 5000000
      cost_basis = 2500000
      "#,
    )
    .unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.state_source.kind, StateSourceKind::Rpc);
    assert_eq!(config.state_source.max_retries, 5);
    assert!((config.solver.target_utilization - 0.98).abs() < f64::EPSILON);
    assert_eq!(config.solver.refine_step, 100);
    assert_eq!(config.quotes.pnl_concurrency, 8);
    assert_eq!(config.positions[0].shares, 5_000_000);
  }

  #[test]
  fn test_rpc_without_url_is_rejected() {
    let config = parse_config(
      r#"
      [service]
      name = "pricer"
      [state_source]
      kind = "rpc"
      "#,
    )
    .unwrap();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_bad_slippage_is_rejected() {
    let mut config = parse_config(MINIMAL).unwrap();
    config.quotes.default_slippage = 1.5;
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn test_inverted_position_is_rejected() {
    let mut config = parse_config(MINIMAL).unwrap();
    config.positions.push(crate::domain::trade::OpenPosition {
      market_id: "0xabc".into(),
      range_start: 200,
      range_end: 100,
      shares: 1,
      cost_basis: 1,
    });
    assert!(validate_config(&config).is_err());
  }
}
