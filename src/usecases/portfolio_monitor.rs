//! Portfolio Monitor Use Case - Periodic PnL Sweep
//!
//! Every `monitor.interval_seconds`:
//! 1. Check the state source and the trade log, publish readiness
//! 2. Load the trade log
//! 3. Price every configured position via `calculate_total_pnl`
//! 4. Log the totals and update the PnL gauges
//!
//! The sweep shares the shutdown cancellation token, so an in-flight
//! pricing round is abandoned as soon as shutdown begins.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::adapters::metrics::{HealthState, QuoteMetrics};
use crate::domain::error::PricingError;
use crate::domain::quote::TotalPnl;
use crate::domain::trade::OpenPosition;
use crate::domain::units::{format_micro_currency, format_percent};
use crate::ports::state_source::StateSource;
use crate::ports::trade_history::TradeHistory;

use super::quote_service::QuoteService;

/// Periodically marks the configured portfolio to market.
pub struct PortfolioMonitor<S: StateSource, H: TradeHistory> {
  quotes: Arc<QuoteService<S>>,
  history: Arc<H>,
  positions: Vec<OpenPosition>,
  metrics: Arc<QuoteMetrics>,
  health: Arc<HealthState>,
  interval: Duration,
}

impl<S: StateSource, H: TradeHistory> PortfolioMonitor<S, H> {
  /// Create a new portfolio monitor.
  pub fn new(
    quotes: Arc<QuoteService<S>>,
    history: Arc<H>,
    positions: Vec<OpenPosition>,
    metrics: Arc<QuoteMetrics>,
    health: Arc<HealthState>,
    interval: Duration,
  ) -> Self {
    Self {
      quotes,
      history,
      positions,
      metrics,
      health,
      interval,
    }
  }

  /// Sweep on every tick until `shutdown` is cancelled.
  pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
      positions = self.positions.len(),
      interval_secs = self.interval.as_secs(),
      "Portfolio monitor started"
    );

    loop {
      tokio::select! {
        biased;
        () = shutdown.cancelled() => {
          info!("Portfolio monitor received shutdown signal");
          break;
        }
        _ = ticker.tick() => {
          if let Err(e) = self.sweep(&shutdown).await {
            if matches!(e.downcast_ref::<PricingError>(), Some(PricingError::Cancelled)) {
              break;
            }
            warn!(error = %format!("{e:#}"), "Portfolio sweep failed");
          }
        }
      }
    }

    info!("Portfolio monitor stopped cleanly");
    Ok(())
  }

  /// Run a single sweep and return the totals it published.
  #[instrument(skip_all)]
  pub async fn sweep(&self, cancel: &CancellationToken) -> Result<TotalPnl> {
    let up = self.quotes.source().is_healthy().await;
    self.metrics.set_state_source_up(up);
    self.health.state_source_healthy.store(up, Ordering::Relaxed);
    if !up {
      warn!("State source health check failed");
    }

    let log_ok = self.history.is_healthy().await;
    self.health.trade_log_healthy.store(log_ok, Ordering::Relaxed);
    if !log_ok {
      warn!("Trade log health check failed");
    }

    let trades = self
      .history
      .load_trades()
      .await
      .context("Failed to load trade history")?;

    let total = self
      .quotes
      .calculate_total_pnl(&trades, &self.positions, cancel)
      .await?;

    self.metrics.set_pnl(&total);
    info!(
      trades = trades.len(),
      positions = total.positions.len(),
      realized = %format_micro_currency(total.realized.realized_pnl),
      unrealized = %format_micro_currency(total.total_unrealized_pnl),
      total = %format_micro_currency(total.total_pnl),
      total_pct = %format_percent(total.total_pnl_percent),
      "Portfolio marked to market"
    );

    Ok(total)
  }
}
