//! State Source Port - Market State Read Interface
//!
//! Defines the trait the pricing core uses to read raw market objects
//! from the ledger (or any stand-in for it). Implementations own
//! transport concerns such as timeouts and retries; the core only sees
//! `anyhow::Result` and wraps failures as `PricingError::StateSource`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a market keeps its bucket → shares distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSource {
  /// Distribution embedded in the market object itself.
  Inline { entries: BTreeMap<i64, u128> },
  /// Distribution stored in a separate table keyed by bucket index.
  Table {
    /// Ledger identifier of the table.
    table_id: String,
    /// Buckets with an entry in the table.
    active_buckets: Vec<i64>,
  },
  /// The object carries no recognizable distribution.
  Missing,
}

/// Raw market object as read from the ledger.
///
/// Every field is optional: objects in the wild may be partially
/// populated or of an unrelated type. The state reader decides which
/// gaps are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketObject {
  /// Ledger object identifier.
  pub id: String,
  /// Liquidity parameter (micro-units).
  #[serde(default)]
  pub alpha: Option<u128>,
  /// Collateral held by the market (micro-units).
  #[serde(default)]
  pub balance: Option<u128>,
  /// Lower bound of the outcome domain.
  #[serde(default)]
  pub min_value: Option<i64>,
  /// Upper bound of the outcome domain.
  #[serde(default)]
  pub max_value: Option<i64>,
  /// Width of one bucket in outcome units.
  #[serde(default)]
  pub bucket_width: Option<i64>,
  /// Per-bucket share ceiling, when the market sets one.
  #[serde(default)]
  pub max_shares_per_bucket: Option<u128>,
  /// Share distribution location.
  pub distribution: DistributionSource,
}

/// Trait for market state providers.
///
/// Reads are always fresh: implementors must not cache market objects
/// across calls, since quotes are only as good as the state they see.
#[async_trait]
pub trait StateSource: Send + Sync + 'static {
  /// Fetch a market object. `Ok(None)` when no such object exists.
  async fn market_object(&self, market_id: &str) -> anyhow::Result<Option<MarketObject>>;

  /// Read one table entry. `Ok(None)` when the bucket has no entry.
  async fn bucket_shares(&self, table_id: &str, bucket: i64) -> anyhow::Result<Option<u128>>;

  /// Check if the source is reachable.
  async fn is_healthy(&self) -> bool;
}
