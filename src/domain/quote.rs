//! Quote and PnL value objects plus the pure arithmetic behind them.
//!
//! Quotes are produced fresh per call and never persisted. Integer
//! fields are micro-units; `*_usdc` / `*_decimal` fields are the same
//! amounts as display decimals.

use rust_decimal::prelude::*;
use serde::Serialize;

use super::buckets::BucketRange;
use super::error::PricingError;
use super::trade::{MarketId, Trade, TradeSide};

/// Slippage applied when the caller does not pass one (5%).
pub const DEFAULT_SLIPPAGE: f64 = 0.05;

/// Quote for spending a fixed amount on a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyQuote {
    pub market_id: MarketId,
    pub range_min: i64,
    pub range_max: i64,
    pub bucket_range: BucketRange,
    /// Budget the quote was solved for.
    pub amount: u128,
    /// Shares added to each bucket in range.
    pub shares: u128,
    /// Collateral those shares cost (≤ amount).
    pub cost: u128,
    pub shares_decimal: Decimal,
    pub cost_usdc: Decimal,
    /// Probability of the range before the trade (0–100).
    pub probability: f64,
    /// Probability of the range after the trade (0–100).
    pub resulting_probability: f64,
    /// cost / shares; zero when no shares are affordable.
    pub price_per_share: Decimal,
    /// Lower bound on shares to accept at execution.
    pub min_shares_out: u128,
    pub slippage: f64,
}

/// Quote for selling a fixed share count out of a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellQuote {
    pub market_id: MarketId,
    pub range_min: i64,
    pub range_max: i64,
    pub bucket_range: BucketRange,
    pub shares: u128,
    /// Collateral returned for the shares.
    pub payout: u128,
    pub shares_decimal: Decimal,
    pub payout_usdc: Decimal,
    pub probability: f64,
    pub resulting_probability: f64,
    /// payout / shares; zero for a zero-share quote.
    pub price_per_share: Decimal,
    /// Lower bound on collateral to accept at execution.
    pub min_usdc_out: u128,
    pub slippage: f64,
}

/// Mark-to-market value of one open position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionPnl {
    pub market_id: MarketId,
    pub range_start: i64,
    pub range_end: i64,
    pub shares: u128,
    pub cost_basis: u128,
    /// Payout a zero-slippage sell would return right now.
    pub current_value: u128,
    pub unrealized_pnl: i128,
    pub unrealized_pnl_percent: f64,
}

impl PositionPnl {
    pub fn new(
        market_id: MarketId,
        range_start: i64,
        range_end: i64,
        shares: u128,
        cost_basis: u128,
        current_value: u128,
    ) -> Self {
        let unrealized_pnl = signed_diff(current_value, cost_basis);
        Self {
            market_id,
            range_start,
            range_end,
            shares,
            cost_basis,
            current_value,
            unrealized_pnl,
            unrealized_pnl_percent: pnl_percent(unrealized_pnl, cost_basis),
        }
    }
}

/// Realized PnL over a trade history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RealizedPnl {
    pub total_bought: u128,
    pub total_sold: u128,
    pub realized_pnl: i128,
    pub realized_pnl_percent: f64,
}

/// Realized plus unrealized PnL across a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalPnl {
    pub realized: RealizedPnl,
    pub positions: Vec<PositionPnl>,
    pub total_cost_basis: u128,
    pub total_current_value: u128,
    pub total_unrealized_pnl: i128,
    pub total_pnl: i128,
    /// Relative to total bought, or to open cost basis when nothing was bought.
    pub total_pnl_percent: f64,
}

impl TotalPnl {
    /// Combine a realized figure with per-position marks.
    pub fn combine(realized: RealizedPnl, positions: Vec<PositionPnl>) -> Self {
        let total_cost_basis = positions
            .iter()
            .fold(0u128, |acc, p| acc.saturating_add(p.cost_basis));
        let total_current_value = positions
            .iter()
            .fold(0u128, |acc, p| acc.saturating_add(p.current_value));
        let total_unrealized_pnl = positions
            .iter()
            .fold(0i128, |acc, p| acc.saturating_add(p.unrealized_pnl));
        let total_pnl = realized.realized_pnl.saturating_add(total_unrealized_pnl);

        let denominator = if realized.total_bought > 0 {
            realized.total_bought
        } else {
            total_cost_basis
        };

        Self {
            realized,
            positions,
            total_cost_basis,
            total_current_value,
            total_unrealized_pnl,
            total_pnl,
            total_pnl_percent: pnl_percent(total_pnl, denominator),
        }
    }
}

/// Sum buys and sells; realized PnL = sold − bought.
///
/// An empty history yields all zeros.
pub fn calculate_realized_pnl(trades: &[Trade]) -> RealizedPnl {
    let (total_bought, total_sold) =
        trades
            .iter()
            .fold((0u128, 0u128), |(bought, sold), trade| match trade.side {
                TradeSide::Buy => (bought.saturating_add(trade.amount), sold),
                TradeSide::Sell => (bought, sold.saturating_add(trade.amount)),
            });

    let realized_pnl = signed_diff(total_sold, total_bought);
    RealizedPnl {
        total_bought,
        total_sold,
        realized_pnl,
        realized_pnl_percent: pnl_percent(realized_pnl, total_bought),
    }
}

/// Validate a slippage fraction and convert it to a decimal.
///
/// # Errors
/// `InvalidInput` unless `slippage` is finite and within [0, 1].
pub fn slippage_fraction(slippage: f64) -> Result<Decimal, PricingError> {
    if !slippage.is_finite() || !(0.0..=1.0).contains(&slippage) {
        return Err(PricingError::invalid(format!(
            "slippage must be within [0, 1], got {slippage}"
        )));
    }
    Decimal::from_f64(slippage)
        .ok_or_else(|| PricingError::invalid(format!("slippage {slippage} is not representable")))
}

/// `shares − shares × floor(slippage × 100) / 100`, in integers.
///
/// # Errors
/// `ComputationFailure` if the percentage cannot be formed.
pub fn min_shares_out(shares: u128, slippage: Decimal) -> Result<u128, PricingError> {
    let percent = (slippage * Decimal::ONE_HUNDRED)
        .floor()
        .to_u128()
        .ok_or_else(|| PricingError::computation("slippage percent out of range"))?
        .min(100);

    // floor(shares · percent / 100) without overflowing the product
    let haircut = (shares / 100) * percent + (shares % 100) * percent / 100;
    Ok(shares - haircut)
}

/// `floor(payout × (1 − slippage))`.
///
/// # Errors
/// `ComputationFailure` if the payout exceeds decimal range.
pub fn min_usdc_out(payout: u128, slippage: Decimal) -> Result<u128, PricingError> {
    let payout_dec = Decimal::from_u128(payout)
        .ok_or_else(|| PricingError::computation(format!("payout {payout} exceeds decimal range")))?;
    payout_dec
        .checked_mul(Decimal::ONE - slippage)
        .and_then(|v| v.floor().to_u128())
        .ok_or_else(|| PricingError::computation("min payout out of range"))
}

/// `amount / shares` as a decimal price; zero when `shares == 0`.
///
/// # Errors
/// `ComputationFailure` if either side exceeds decimal range.
pub fn price_per_share(amount: u128, shares: u128) -> Result<Decimal, PricingError> {
    if shares == 0 {
        return Ok(Decimal::ZERO);
    }
    let amount = Decimal::from_u128(amount)
        .ok_or_else(|| PricingError::computation("amount exceeds decimal range"))?;
    let shares = Decimal::from_u128(shares)
        .ok_or_else(|| PricingError::computation("shares exceed decimal range"))?;
    amount
        .checked_div(shares)
        .map(|p| p.round_dp(6))
        .ok_or_else(|| PricingError::computation("price per share out of range"))
}

/// `pnl / basis × 100`, zero for a zero basis.
#[allow(clippy::cast_precision_loss)]
pub fn pnl_percent(pnl: i128, basis: u128) -> f64 {
    if basis == 0 {
        return 0.0;
    }
    pnl as f64 / basis as f64 * 100.0
}

fn signed_diff(a: u128, b: u128) -> i128 {
    if a >= b {
        i128::try_from(a - b).unwrap_or(i128::MAX)
    } else {
        i128::try_from(b - a).map_or(i128::MIN, |d| -d)
    }
}
