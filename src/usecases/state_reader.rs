//! State Reader Use Case - Market Snapshot Assembly
//!
//! Turns a raw ledger object into a validated `MarketState`. Table-backed
//! distributions are read entry by entry with bounded parallel fan-out.
//! Nothing is cached: every call reads fresh state.

use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::domain::error::PricingError;
use crate::domain::market_state::{MarketParams, MarketState};
use crate::ports::state_source::{DistributionSource, StateSource};

/// Parallel table reads used by [`get_market_state`].
pub const DEFAULT_MAX_CONCURRENT_READS: usize = 16;

/// Read and validate the current state of `market_id`.
///
/// # Errors
/// - `NotFound` when the object is absent or lacks a required field
/// - `StateSource` when the source itself fails
/// - `InvalidInput` when the stored parameters are out of range
pub async fn get_market_state<S>(source: &S, market_id: &str) -> Result<MarketState, PricingError>
where
  S: StateSource + ?Sized,
{
  read_market_state(source, market_id, DEFAULT_MAX_CONCURRENT_READS).await
}

/// [`get_market_state`] with an explicit table-read fan-out.
#[instrument(skip(source))]
pub async fn read_market_state<S>(
  source: &S,
  market_id: &str,
  max_concurrent_reads: usize,
) -> Result<MarketState, PricingError>
where
  S: StateSource + ?Sized,
{
  let object = source
    .market_object(market_id)
    .await
    .map_err(PricingError::StateSource)?
    .ok_or_else(|| PricingError::NotFound(format!("market {market_id} does not exist")))?;

  let missing = |field: &str| PricingError::NotFound(format!("market {market_id} has no {field}"));

  let alpha = object.alpha.ok_or_else(|| missing("alpha"))?;
  let bucket_width = object.bucket_width.ok_or_else(|| missing("bucket_width"))?;
  let min_value = object.min_value.ok_or_else(|| missing("min_value"))?;
  let max_value = object.max_value.ok_or_else(|| missing("max_value"))?;

  let distribution = match object.distribution {
    DistributionSource::Inline { entries } => entries,
    DistributionSource::Table {
      table_id,
      active_buckets,
    } => read_table(source, &table_id, &active_buckets, max_concurrent_reads).await?,
    DistributionSource::Missing => return Err(missing("distribution")),
  };

  let state = MarketState::new(MarketParams {
    distribution,
    alpha,
    balance: object.balance.unwrap_or(0),
    min_value,
    max_value,
    bucket_width,
    max_shares_per_bucket: object.max_shares_per_bucket,
  })?;

  debug!(
    market_id,
    active = state.active_count(),
    buckets = state.bucket_count(),
    alpha = %alpha,
    balance = %state.balance(),
    "Market state read"
  );
  Ok(state)
}

/// Fetch every active bucket of a table. Absent entries hold zero shares.
async fn read_table<S>(
  source: &S,
  table_id: &str,
  active_buckets: &[i64],
  max_concurrent_reads: usize,
) -> Result<BTreeMap<i64, u128>, PricingError>
where
  S: StateSource + ?Sized,
{
  stream::iter(active_buckets.iter().copied())
    .map(|bucket| async move {
      source
        .bucket_shares(table_id, bucket)
        .await
        .map(|shares| (bucket, shares.unwrap_or(0)))
    })
    .buffer_unordered(max_concurrent_reads.max(1))
    .try_collect()
    .await
    .map_err(PricingError::StateSource)
}
