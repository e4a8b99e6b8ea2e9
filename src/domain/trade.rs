//! Trade history and open-position records.
//!
//! All monetary and share fields are integer micro-units; range bounds
//! are in the outcome's native units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger object identifier of a market.
pub type MarketId = String;

/// Trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// An executed range trade, as recorded in the trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Internal trade ID.
    pub id: Uuid,
    /// Market the trade executed against.
    pub market_id: MarketId,
    /// Buy or sell.
    pub side: TradeSide,
    /// Lower bound of the traded range (inclusive).
    pub range_start: i64,
    /// Upper bound of the traded range (exclusive).
    pub range_end: i64,
    /// Shares added to / removed from each bucket in range.
    pub shares: u128,
    /// Collateral paid (buy) or received (sell).
    pub amount: u128,
    /// Execution timestamp.
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Record a trade executed now.
    pub fn new(
        market_id: impl Into<MarketId>,
        side: TradeSide,
        range_start: i64,
        range_end: i64,
        shares: u128,
        amount: u128,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            market_id: market_id.into(),
            side,
            range_start,
            range_end,
            shares,
            amount,
            executed_at: Utc::now(),
        }
    }
}

/// A currently held range position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub market_id: MarketId,
    pub range_start: i64,
    pub range_end: i64,
    /// Shares held in each bucket of the range.
    pub shares: u128,
    /// Collateral spent acquiring the position.
    pub cost_basis: u128,
}
