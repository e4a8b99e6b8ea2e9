//! Quote Service Use Case - Buy/Sell Quotes and PnL
//!
//! Composes the state reader, the LMSR engine and the solver into the
//! operations callers actually ask for:
//! 1. Validate caller input (before any state read)
//! 2. Read a fresh market snapshot
//! 3. Map the value range onto buckets and price it
//! 4. Apply slippage bounds and unit conversions
//!
//! The state source is injected; the service holds no other state.
//! When metrics are attached, every public operation records its
//! outcome and latency under its own `kind` label.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::adapters::metrics::QuoteMetrics;
use crate::config::QuotesConfig;
use crate::domain::buckets::map_range_to_buckets;
use crate::domain::error::PricingError;
use crate::domain::lmsr::LmsrEngine;
use crate::domain::market_state::MarketState;
use crate::domain::quote::{
  calculate_realized_pnl, min_shares_out, min_usdc_out, price_per_share, slippage_fraction,
  BuyQuote, PositionPnl, SellQuote, TotalPnl,
};
use crate::domain::solver::QuoteSolver;
use crate::domain::trade::{OpenPosition, Trade};
use crate::domain::units::from_micro_units;
use crate::ports::state_source::StateSource;
use crate::usecases::state_reader::read_market_state;

/// Quote and PnL façade over a `StateSource`.
pub struct QuoteService<S: StateSource> {
  source: Arc<S>,
  solver: QuoteSolver,
  default_slippage: f64,
  max_concurrent_reads: usize,
  pnl_concurrency: usize,
  metrics: Option<Arc<QuoteMetrics>>,
}

impl<S: StateSource> QuoteService<S> {
  /// Create a quote service.
  pub fn new(source: Arc<S>, solver: QuoteSolver, quotes: &QuotesConfig) -> Self {
    Self {
      source,
      solver,
      default_slippage: quotes.default_slippage,
      max_concurrent_reads: quotes.max_concurrent_reads.max(1),
      pnl_concurrency: quotes.pnl_concurrency.max(1),
      metrics: None,
    }
  }

  /// Record quote counters and latencies on `metrics`.
  pub fn with_metrics(mut self, metrics: Arc<QuoteMetrics>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  /// The injected state source.
  pub fn source(&self) -> &S {
    &self.source
  }

  /// Quote spending `amount` micro-units on `[range_min, range_max)`.
  ///
  /// `slippage` defaults to the configured value. An amount too small
  /// to buy anything yields a zero-share quote, not an error.
  #[instrument(skip(self))]
  pub async fn get_buy_quote(
    &self,
    market_id: &str,
    range_min: i64,
    range_max: i64,
    amount: u128,
    slippage: Option<f64>,
  ) -> Result<BuyQuote, PricingError> {
    self
      .observed("buy", self.buy_quote(market_id, range_min, range_max, amount, slippage))
      .await
  }

  /// Quote selling `shares` out of every bucket of `[range_min, range_max)`.
  #[instrument(skip(self))]
  pub async fn get_sell_quote(
    &self,
    market_id: &str,
    range_min: i64,
    range_max: i64,
    shares: u128,
    slippage: Option<f64>,
  ) -> Result<SellQuote, PricingError> {
    self
      .observed("sell", self.sell_quote(market_id, range_min, range_max, shares, slippage))
      .await
  }

  /// Mark a position to market with a zero-slippage sell quote.
  #[instrument(skip(self))]
  pub async fn calculate_position_pnl(
    &self,
    market_id: &str,
    range_start: i64,
    range_end: i64,
    shares: u128,
    cost_basis: u128,
  ) -> Result<PositionPnl, PricingError> {
    self
      .observed(
        "position_pnl",
        self.position_pnl(market_id, range_start, range_end, shares, cost_basis),
      )
      .await
  }

  /// Realized PnL over `trades` plus unrealized PnL over `positions`.
  ///
  /// Positions are priced concurrently (at most `pnl_concurrency` at a
  /// time). Any failure fails the whole call; cancelling `cancel`
  /// aborts outstanding pricing with `PricingError::Cancelled`.
  #[instrument(skip_all, fields(trades = trades.len(), positions = positions.len()))]
  pub async fn calculate_total_pnl(
    &self,
    trades: &[Trade],
    positions: &[OpenPosition],
    cancel: &CancellationToken,
  ) -> Result<TotalPnl, PricingError> {
    self
      .observed("total_pnl", self.total_pnl(trades, positions, cancel))
      .await
  }

  async fn observed<T>(
    &self,
    kind: &str,
    operation: impl Future<Output = Result<T, PricingError>>,
  ) -> Result<T, PricingError> {
    let started = Instant::now();
    let result = operation.await;
    if let Some(metrics) = &self.metrics {
      metrics.observe_quote(kind, started.elapsed(), &result);
    }
    result
  }

  async fn buy_quote(
    &self,
    market_id: &str,
    range_min: i64,
    range_max: i64,
    amount: u128,
    slippage: Option<f64>,
  ) -> Result<BuyQuote, PricingError> {
    let slippage = slippage.unwrap_or(self.default_slippage);
    let slippage_dec = slippage_fraction(slippage)?;
    check_range(range_min, range_max)?;

    let state = self.read_state(market_id).await?;
    let bucket_range = map_range_to_buckets(range_min, range_max, state.bucket_width())?;
    let engine = LmsrEngine::new(&state);

    let probability = engine.probability(bucket_range);
    let solved = self.solver.solve(&state, bucket_range, amount);
    let resulting_probability = if solved.shares == 0 {
      probability
    } else {
      engine.probability_after_buy(bucket_range, solved.shares)?
    };

    let quote = BuyQuote {
      market_id: market_id.to_string(),
      range_min,
      range_max,
      bucket_range,
      amount,
      shares: solved.shares,
      cost: solved.cost,
      shares_decimal: from_micro_units(solved.shares)?,
      cost_usdc: from_micro_units(solved.cost)?,
      probability,
      resulting_probability,
      price_per_share: price_per_share(solved.cost, solved.shares)?,
      min_shares_out: min_shares_out(solved.shares, slippage_dec)?,
      slippage,
    };

    debug!(
      buckets = %bucket_range,
      amount = %amount,
      shares = %quote.shares,
      cost = %quote.cost,
      probability = quote.probability,
      "Buy quote computed"
    );
    Ok(quote)
  }

  async fn sell_quote(
    &self,
    market_id: &str,
    range_min: i64,
    range_max: i64,
    shares: u128,
    slippage: Option<f64>,
  ) -> Result<SellQuote, PricingError> {
    let slippage = slippage.unwrap_or(self.default_slippage);
    let slippage_dec = slippage_fraction(slippage)?;
    check_range(range_min, range_max)?;

    let state = self.read_state(market_id).await?;
    let bucket_range = map_range_to_buckets(range_min, range_max, state.bucket_width())?;
    let engine = LmsrEngine::new(&state);

    let probability = engine.probability(bucket_range);
    let payout = engine.payout_for_sell(bucket_range, shares)?;
    let resulting_probability = if shares == 0 {
      probability
    } else {
      engine.probability_after_sell(bucket_range, shares)
    };

    let quote = SellQuote {
      market_id: market_id.to_string(),
      range_min,
      range_max,
      bucket_range,
      shares,
      payout,
      shares_decimal: from_micro_units(shares)?,
      payout_usdc: from_micro_units(payout)?,
      probability,
      resulting_probability,
      price_per_share: price_per_share(payout, shares)?,
      min_usdc_out: min_usdc_out(payout, slippage_dec)?,
      slippage,
    };

    debug!(
      buckets = %bucket_range,
      shares = %shares,
      payout = %payout,
      "Sell quote computed"
    );
    Ok(quote)
  }

  async fn position_pnl(
    &self,
    market_id: &str,
    range_start: i64,
    range_end: i64,
    shares: u128,
    cost_basis: u128,
  ) -> Result<PositionPnl, PricingError> {
    let quote = self
      .sell_quote(market_id, range_start, range_end, shares, Some(0.0))
      .await?;

    Ok(PositionPnl::new(
      market_id.to_string(),
      range_start,
      range_end,
      shares,
      cost_basis,
      quote.payout,
    ))
  }

  async fn total_pnl(
    &self,
    trades: &[Trade],
    positions: &[OpenPosition],
    cancel: &CancellationToken,
  ) -> Result<TotalPnl, PricingError> {
    if cancel.is_cancelled() {
      return Err(PricingError::Cancelled);
    }

    let realized = calculate_realized_pnl(trades);

    let pricing = stream::iter(positions.iter().cloned())
      .map(|p| async move {
        self
          .calculate_position_pnl(&p.market_id, p.range_start, p.range_end, p.shares, p.cost_basis)
          .await
      })
      .buffered(self.pnl_concurrency)
      .try_collect::<Vec<_>>();

    let priced = tokio::select! {
      biased;
      () = cancel.cancelled() => {
        info!("Total PnL computation cancelled");
        return Err(PricingError::Cancelled);
      }
      result = pricing => result?,
    };

    Ok(TotalPnl::combine(realized, priced))
  }

  async fn read_state(&self, market_id: &str) -> Result<MarketState, PricingError> {
    read_market_state(self.source.as_ref(), market_id, self.max_concurrent_reads).await
  }
}

fn check_range(range_min: i64, range_max: i64) -> Result<(), PricingError> {
  if range_min >= range_max {
    return Err(PricingError::InvalidInput(format!(
      "range min {range_min} must be below range max {range_max}"
    )));
  }
  Ok(())
}
