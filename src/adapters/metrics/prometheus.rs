//! Prometheus Metrics Registry - Pricing Observability
//!
//! Registers quote counters, latency histograms, failure counters by
//! error class and portfolio PnL gauges. Exposed on `/metrics` by the
//! health server.

use std::time::Duration;

use anyhow::Context;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use rust_decimal::prelude::ToPrimitive;

use crate::domain::error::PricingError;
use crate::domain::quote::TotalPnl;
use crate::domain::units::signed_micro_to_decimal;

/// Centralized Prometheus metrics for the pricing service.
///
/// All metrics follow the naming convention `range_pricer_*`. Quote
/// metrics carry a `kind` label (`buy`, `sell`, `position_pnl`,
/// `total_pnl`).
pub struct QuoteMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Successful quotes.
    pub quotes_total: IntCounterVec,
    /// Failed quotes by error class.
    pub quote_failures: IntCounterVec,
    /// Quote latency histogram (microseconds).
    pub quote_latency_us: HistogramVec,
    /// Realized PnL in USDC.
    pub realized_pnl: Gauge,
    /// Unrealized PnL in USDC.
    pub unrealized_pnl: Gauge,
    /// Open positions priced in the last sweep.
    pub open_positions: IntGauge,
    /// State source reachability (1 = up).
    pub state_source_up: IntGauge,
}

impl QuoteMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let quotes_total = IntCounterVec::new(
            Opts::new("range_pricer_quotes_total", "Quotes served"),
            &["kind"],
        )?;

        let quote_failures = IntCounterVec::new(
            Opts::new("range_pricer_quote_failures_total", "Quotes failed by error class"),
            &["kind", "error"],
        )?;

        let quote_latency_us = HistogramVec::new(
            HistogramOpts::new(
                "range_pricer_quote_latency_us",
                "Quote latency in microseconds, state reads included",
            )
            .buckets(vec![
                100.0, 500.0, 1_000.0, 5_000.0, 20_000.0, 100_000.0, 500_000.0, 2_000_000.0,
            ]),
            &["kind"],
        )?;

        let realized_pnl = Gauge::new(
            "range_pricer_realized_pnl_usdc",
            "Realized PnL over the trade log in USDC",
        )?;

        let unrealized_pnl = Gauge::new(
            "range_pricer_unrealized_pnl_usdc",
            "Unrealized PnL of open positions in USDC",
        )?;

        let open_positions = IntGauge::new(
            "range_pricer_open_positions",
            "Open positions priced in the last sweep",
        )?;

        let state_source_up = IntGauge::new(
            "range_pricer_state_source_up",
            "Whether the state source answered its last health check (1=yes, 0=no)",
        )?;

        registry.register(Box::new(quotes_total.clone()))?;
        registry.register(Box::new(quote_failures.clone()))?;
        registry.register(Box::new(quote_latency_us.clone()))?;
        registry.register(Box::new(realized_pnl.clone()))?;
        registry.register(Box::new(unrealized_pnl.clone()))?;
        registry.register(Box::new(open_positions.clone()))?;
        registry.register(Box::new(state_source_up.clone()))?;

        Ok(Self {
            registry,
            quotes_total,
            quote_failures,
            quote_latency_us,
            realized_pnl,
            unrealized_pnl,
            open_positions,
            state_source_up,
        })
    }

    /// Record the outcome and latency of one quote.
    pub fn observe_quote<T>(
        &self,
        kind: &str,
        elapsed: Duration,
        result: &Result<T, PricingError>,
    ) {
        #[allow(clippy::cast_precision_loss)]
        let micros = elapsed.as_micros() as f64;
        self.quote_latency_us.with_label_values(&[kind]).observe(micros);
        match result {
            Ok(_) => self.quotes_total.with_label_values(&[kind]).inc(),
            Err(e) => self
                .quote_failures
                .with_label_values(&[kind, e.kind()])
                .inc(),
        }
    }

    /// Publish portfolio totals.
    pub fn set_pnl(&self, total: &TotalPnl) {
        self.realized_pnl
            .set(micro_to_f64(total.realized.realized_pnl));
        self.unrealized_pnl
            .set(micro_to_f64(total.total_unrealized_pnl));
        self.open_positions
            .set(i64::try_from(total.positions.len()).unwrap_or(i64::MAX));
    }

    pub fn set_state_source_up(&self, up: bool) {
        self.state_source_up.set(i64::from(up));
    }

    /// Encode every registered metric in the text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not UTF-8")
    }
}

fn micro_to_f64(micros: i128) -> f64 {
    signed_micro_to_decimal(micros)
        .ok()
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}
