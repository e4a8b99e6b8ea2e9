//! Immutable snapshot of an on-ledger range market.
//!
//! The share distribution is a single ordered map keyed by absolute
//! bucket index; the active-bucket set is its key set, so the two can
//! never drift apart. Snapshots are rebuilt from the state source on
//! every pricing call and are never mutated in place.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::PricingError;

/// Raw parameters a [`MarketState`] is validated from.
#[derive(Debug, Clone, Default)]
pub struct MarketParams {
    /// Bucket index → share count (micro-units). Absent = zero shares.
    pub distribution: BTreeMap<i64, u128>,
    /// Liquidity parameter.
    pub alpha: u128,
    /// Collateral held by the market (informational).
    pub balance: u128,
    /// Lower bound of the outcome domain.
    pub min_value: i64,
    /// Upper bound of the outcome domain.
    pub max_value: i64,
    /// Width of one bucket in outcome units.
    pub bucket_width: i64,
    /// Per-bucket share ceiling; `None` or zero falls back to `alpha`.
    pub max_shares_per_bucket: Option<u128>,
}

/// Validated, read-only market snapshot consumed by the LMSR engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketState {
    distribution: BTreeMap<i64, u128>,
    alpha: u128,
    balance: u128,
    min_value: i64,
    max_value: i64,
    bucket_width: i64,
    bucket_count: u64,
    max_shares_per_bucket: u128,
}

impl MarketState {
    /// Validate parameters and build a snapshot.
    ///
    /// # Errors
    /// `InvalidInput` if `alpha == 0`, `bucket_width <= 0` or the value
    /// domain is empty.
    pub fn new(params: MarketParams) -> Result<Self, PricingError> {
        if params.alpha == 0 {
            return Err(PricingError::invalid("alpha must be positive"));
        }
        if params.bucket_width <= 0 {
            return Err(PricingError::invalid(format!(
                "bucket width must be positive, got {}",
                params.bucket_width
            )));
        }
        if params.min_value >= params.max_value {
            return Err(PricingError::invalid(format!(
                "min value {} must be below max value {}",
                params.min_value, params.max_value
            )));
        }

        let span = i128::from(params.max_value) - i128::from(params.min_value);
        let width = i128::from(params.bucket_width);
        let bucket_count = u64::try_from((span + width - 1) / width)
            .map_err(|_| PricingError::invalid("bucket count out of range"))?;

        let max_shares_per_bucket = match params.max_shares_per_bucket {
            Some(cap) if cap > 0 => cap,
            _ => params.alpha,
        };

        Ok(Self {
            distribution: params.distribution,
            alpha: params.alpha,
            balance: params.balance,
            min_value: params.min_value,
            max_value: params.max_value,
            bucket_width: params.bucket_width,
            bucket_count,
            max_shares_per_bucket,
        })
    }

    pub fn distribution(&self) -> &BTreeMap<i64, u128> {
        &self.distribution
    }

    /// Active buckets in ascending order.
    pub fn active_buckets(&self) -> impl Iterator<Item = i64> + '_ {
        self.distribution.keys().copied()
    }

    pub fn active_count(&self) -> usize {
        self.distribution.len()
    }

    /// Whether no bucket is active.
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }

    /// Shares held by `bucket` (zero when inactive).
    pub fn shares(&self, bucket: i64) -> u128 {
        self.distribution.get(&bucket).copied().unwrap_or(0)
    }

    pub fn alpha(&self) -> u128 {
        self.alpha
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    pub fn bucket_width(&self) -> i64 {
        self.bucket_width
    }

    pub fn bucket_count(&self) -> u64 {
        self.bucket_count
    }

    pub fn max_shares_per_bucket(&self) -> u128 {
        self.max_shares_per_bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MarketParams {
        MarketParams {
            distribution: BTreeMap::from([(5, 1_000), (7, 2_000)]),
            alpha: 1_000_000,
            balance: 50_000_000,
            min_value: 0,
            max_value: 1_000,
            bucket_width: 100,
            max_shares_per_bucket: None,
        }
    }

    #[test]
    fn test_new_derives_bucket_count_and_cap() {
        let state = MarketState::new(params()).unwrap();
        assert_eq!(state.bucket_count(), 10);
        assert_eq!(state.max_shares_per_bucket(), 1_000_000);
        assert_eq!(state.active_buckets().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(state.shares(6), 0);
        assert_eq!(state.shares(7), 2_000);
    }

    #[test]
    fn test_bucket_count_rounds_up() {
        let state = MarketState::new(MarketParams {
            max_value: 1_050,
            ..params()
        })
        .unwrap();
        assert_eq!(state.bucket_count(), 11);
    }

    #[test]
    fn test_explicit_share_cap() {
        let state = MarketState::new(MarketParams {
            max_shares_per_bucket: Some(42),
            ..params()
        })
        .unwrap();
        assert_eq!(state.max_shares_per_bucket(), 42);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        for bad in [
            MarketParams { alpha: 0, ..params() },
            MarketParams { bucket_width: 0, ..params() },
            MarketParams { bucket_width: -100, ..params() },
            MarketParams { min_value: 1_000, ..params() },
        ] {
            assert!(matches!(
                MarketState::new(bad),
                Err(PricingError::InvalidInput(_))
            ));
        }
    }
}
