//! Domain layer - Pricing math and value types.
//!
//! Pure logic for quoting range markets: bucket mapping, the LMSR cost
//! function, the amount → shares solver and PnL arithmetic. Nothing here
//! performs I/O (hexagonal architecture inner ring), so every type can be
//! tested in isolation.

pub mod buckets;
pub mod error;
pub mod lmsr;
pub mod market_state;
pub mod quote;
pub mod solver;
pub mod trade;
pub mod units;

// Re-export core types for convenience
pub use buckets::{map_range_to_buckets, BucketRange};
pub use error::PricingError;
pub use lmsr::LmsrEngine;
pub use market_state::{MarketParams, MarketState};
pub use quote::{
    calculate_realized_pnl, BuyQuote, PositionPnl, RealizedPnl, SellQuote, TotalPnl,
    DEFAULT_SLIPPAGE,
};
pub use solver::{QuoteSolver, SolvedShares, SolverConfig};
pub use trade::{MarketId, OpenPosition, Trade, TradeSide};
