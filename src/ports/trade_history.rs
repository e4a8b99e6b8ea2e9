//! Trade History Port - Trade Log Interface
//!
//! Read side of the executed-trade record, used for realized PnL. Trades
//! are written by whatever executes them; this service only reads.

use async_trait::async_trait;

use crate::domain::trade::Trade;

/// Trait for trade history providers.
#[async_trait]
pub trait TradeHistory: Send + Sync + 'static {
  /// Load every recorded trade, oldest first.
  async fn load_trades(&self) -> anyhow::Result<Vec<Trade>>;

  /// Check if the log can be read.
  async fn is_healthy(&self) -> bool;
}
