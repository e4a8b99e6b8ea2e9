//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the pricing core maintains its
//! mathematical invariants across random markets and trades.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;

use range_market_pricer::domain::buckets::{map_range_to_buckets, BucketRange};
use range_market_pricer::domain::lmsr::LmsrEngine;
use range_market_pricer::domain::market_state::{MarketParams, MarketState};
use range_market_pricer::domain::quote::{
    calculate_realized_pnl, min_shares_out, min_usdc_out,
};
use range_market_pricer::domain::solver::QuoteSolver;
use range_market_pricer::domain::trade::{Trade, TradeSide};

/// Market over buckets [0, 20) of width 100.
fn market(distribution: BTreeMap<i64, u128>, alpha: u128) -> MarketState {
    MarketState::new(MarketParams {
        distribution,
        alpha,
        balance: 0,
        min_value: 0,
        max_value: 2_000,
        bucket_width: 100,
        max_shares_per_bucket: None,
    })
    .unwrap()
}

/// `dist` after adding `shares` to every bucket of `range`.
fn bought(mut dist: BTreeMap<i64, u128>, range: BucketRange, shares: u128) -> BTreeMap<i64, u128> {
    for bucket in range.start..=range.end {
        *dist.entry(bucket).or_insert(0) += shares;
    }
    dist
}

fn distributions() -> impl Strategy<Value = BTreeMap<i64, u128>> {
    prop::collection::btree_map(0i64..20, 0u128..5_000_000, 1..10)
}

/// Every active bucket holds at least one full share.
fn held_distributions() -> impl Strategy<Value = BTreeMap<i64, u128>> {
    prop::collection::btree_map(0i64..20, 1_000_000u128..5_000_000, 1..10)
}

fn ranges() -> impl Strategy<Value = BucketRange> {
    (0i64..20, 0i64..5).prop_map(|(start, len)| BucketRange {
        start,
        end: (start + len).min(19),
    })
}

// ── LMSR Engine Properties ──────────────────────────────────

proptest! {
    /// Probabilities stay in [0, 100] and complementary ranges sum to 100.
    #[test]
    fn probability_bounded_and_complementary(
        dist in distributions(),
        alpha in 100_000u128..100_000_000,
        split in 0i64..19,
    ) {
        let state = market(dist, alpha);
        let engine = LmsrEngine::new(&state);
        let left = engine.probability(BucketRange { start: 0, end: split });
        let right = engine.probability(BucketRange { start: split + 1, end: 19 });

        prop_assert!((0.0..=100.0).contains(&left), "p out of bounds: {left}");
        prop_assert!((0.0..=100.0).contains(&right), "p out of bounds: {right}");
        prop_assert!((left + right - 100.0).abs() < 1e-6, "{left} + {right} != 100");
    }

    /// Buying more shares never costs less.
    #[test]
    fn cost_monotonic_in_shares(
        dist in distributions(),
        alpha in 100_000u128..100_000_000,
        range in ranges(),
        s1 in 1u128..5_000_000,
        delta in 1u128..5_000_000,
    ) {
        let state = market(dist, alpha);
        let engine = LmsrEngine::new(&state);
        let c1 = engine.cost_to_buy(range, s1).unwrap();
        let c2 = engine.cost_to_buy(range, s1 + delta).unwrap();
        prop_assert!(c2 >= c1, "cost({}) = {c2} < cost({s1}) = {c1}", s1 + delta);
    }

    /// Selling never returns more than buying the same shares would cost,
    /// including sells that empty buckets or exceed the holdings.
    #[test]
    fn payout_never_exceeds_cost(
        dist in distributions(),
        alpha in 100_000u128..100_000_000,
        range in ranges(),
        shares in 1u128..20_000_000,
    ) {
        let state = market(dist, alpha);
        let engine = LmsrEngine::new(&state);
        let cost = engine.cost_to_buy(range, shares).unwrap();
        let payout = engine.payout_for_sell(range, shares).unwrap();
        prop_assert!(payout <= cost, "payout {payout} > cost {cost}");
    }

    /// Selling more shares never pays less.
    #[test]
    fn payout_monotonic_in_shares(
        dist in distributions(),
        alpha in 100_000u128..100_000_000,
        range in ranges(),
        s1 in 1u128..5_000_000,
        delta in 1u128..5_000_000,
    ) {
        let state = market(dist, alpha);
        let engine = LmsrEngine::new(&state);
        let p1 = engine.payout_for_sell(range, s1).unwrap();
        let p2 = engine.payout_for_sell(range, s1 + delta).unwrap();
        prop_assert!(p2 + 1 >= p1, "payout({}) = {p2} < payout({s1}) = {p1}", s1 + delta);
    }

    /// Buying then selling the same shares never profits.
    #[test]
    fn round_trip_never_profits(
        dist in held_distributions(),
        alpha in 100_000u128..100_000_000,
        range in ranges(),
        shares in 1u128..5_000_000,
    ) {
        let state = market(dist.clone(), alpha);
        let cost = LmsrEngine::new(&state).cost_to_buy(range, shares).unwrap();
        let after = market(bought(dist, range, shares), alpha);
        let payout = LmsrEngine::new(&after).payout_for_sell(range, shares).unwrap();
        // one micro-unit of slack for cost rounding to nearest
        prop_assert!(payout <= cost + 1, "payout {payout} > cost {cost}");
    }
}

// ── Solver Properties ───────────────────────────────────────

proptest! {
    /// The solver never spends more than the budget.
    #[test]
    fn solver_respects_budget(
        dist in distributions(),
        alpha in 100_000u128..100_000_000,
        range in ranges(),
        amount in 0u128..10_000_000,
    ) {
        let state = market(dist, alpha);
        let solved = QuoteSolver::default().solve(&state, range, amount);
        prop_assert!(solved.cost <= amount, "cost {} > amount {amount}", solved.cost);
        if amount == 0 {
            prop_assert_eq!(solved.shares, 0);
        }
        if solved.shares > 0 {
            let cost = LmsrEngine::new(&state).cost_to_buy(range, solved.shares).unwrap();
            prop_assert_eq!(cost, solved.cost);
        }
    }
}

// ── Slippage and PnL Properties ─────────────────────────────

proptest! {
    /// Slippage floors never exceed the quoted amount.
    #[test]
    fn slippage_bounds_hold(
        amount in 0u128..u128::from(u64::MAX),
        slippage_bps in 0u32..=10_000,
    ) {
        let slippage = Decimal::new(i64::from(slippage_bps), 4);
        prop_assert!(min_shares_out(amount, slippage).unwrap() <= amount);
        prop_assert!(min_usdc_out(amount, slippage).unwrap() <= amount);
    }

    /// Realized PnL is sold minus bought.
    #[test]
    fn realized_pnl_is_sold_minus_bought(
        buys in prop::collection::vec(0u128..1_000_000_000, 0..10),
        sells in prop::collection::vec(0u128..1_000_000_000, 0..10),
    ) {
        let trades: Vec<Trade> = buys
            .iter()
            .map(|&a| Trade::new("m", TradeSide::Buy, 0, 100, 1, a))
            .chain(sells.iter().map(|&a| Trade::new("m", TradeSide::Sell, 0, 100, 1, a)))
            .collect();
        let pnl = calculate_realized_pnl(&trades);
        let bought: u128 = buys.iter().sum();
        let sold: u128 = sells.iter().sum();
        prop_assert_eq!(pnl.total_bought, bought);
        prop_assert_eq!(pnl.total_sold, sold);
        prop_assert_eq!(pnl.realized_pnl, sold as i128 - bought as i128);
    }
}

// ── Bucket Mapping Properties ───────────────────────────────

proptest! {
    /// Mapped spans are ordered and contain both endpoints' buckets.
    #[test]
    fn bucket_mapping_covers_range(
        range_min in -1_000_000i64..1_000_000,
        span in 1i64..100_000,
        width in 1i64..10_000,
    ) {
        let range_max = range_min + span;
        let buckets = map_range_to_buckets(range_min, range_max, width).unwrap();
        prop_assert!(buckets.start <= buckets.end);
        prop_assert!(buckets.start * width <= range_min);
        prop_assert!((buckets.end + 1) * width >= range_max);
    }
}
