//! LMSR Pricing Benchmarks — Hot-Path Performance Validation
//!
//! Benchmarks the pure pricing functions every quote runs through, on
//! a wide sparse market (100k-bucket domain, 2k active buckets).
//!
//! Run with: cargo bench --bench lmsr_bench

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use range_market_pricer::domain::buckets::BucketRange;
use range_market_pricer::domain::lmsr::LmsrEngine;
use range_market_pricer::domain::market_state::{MarketParams, MarketState};
use range_market_pricer::domain::solver::QuoteSolver;

/// Every 50th bucket active, shares varying across the domain.
fn wide_market() -> MarketState {
    let distribution: BTreeMap<i64, u128> = (0..2_000i64)
        .map(|i| (i * 50, 1_000_000 + u128::from(i.unsigned_abs() % 97) * 250_000))
        .collect();

    MarketState::new(MarketParams {
        distribution,
        alpha: 10_000_000,
        balance: 0,
        min_value: 0,
        max_value: 10_000_000,
        bucket_width: 100,
        max_shares_per_bucket: None,
    })
    .expect("valid benchmark market")
}

/// Benchmark range probability over the active set.
fn bench_probability(c: &mut Criterion) {
    let state = wide_market();
    let engine = LmsrEngine::new(&state);
    let range = BucketRange { start: 10_000, end: 60_000 };

    c.bench_function("lmsr_probability_wide", |b| {
        b.iter(|| {
            let _p = engine.probability(black_box(range));
        });
    });
}

/// Benchmark cost of a wide range bet (mostly inactive buckets).
fn bench_cost(c: &mut Criterion) {
    let state = wide_market();
    let engine = LmsrEngine::new(&state);
    let range = BucketRange { start: 10_000, end: 60_000 };

    c.bench_function("lmsr_cost_wide_range", |b| {
        b.iter(|| {
            let _cost = engine.cost_to_buy(black_box(range), black_box(2_500_000));
        });
    });
}

/// Benchmark payout for a sell across active buckets.
fn bench_payout(c: &mut Criterion) {
    let state = wide_market();
    let engine = LmsrEngine::new(&state);
    let range = BucketRange { start: 0, end: 5_000 };

    c.bench_function("lmsr_payout_active_range", |b| {
        b.iter(|| {
            let _payout = engine.payout_for_sell(black_box(range), black_box(500_000));
        });
    });
}

/// Benchmark the amount → shares solver end to end.
fn bench_solver(c: &mut Criterion) {
    let state = wide_market();
    let solver = QuoteSolver::default();
    let range = BucketRange { start: 20_000, end: 20_500 };

    c.bench_function("solver_100_usdc", |b| {
        b.iter(|| {
            let _solved = solver.solve(&state, black_box(range), black_box(100_000_000));
        });
    });
}

criterion_group!(
    benches,
    bench_probability,
    bench_cost,
    bench_payout,
    bench_solver,
);
criterion_main!(benches);
