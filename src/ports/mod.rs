//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `StateSource`: Market object and distribution reads
//! - `TradeHistory`: Executed trade log (JSONL-based)

pub mod state_source;
pub mod trade_history;

pub use state_source::{DistributionSource, MarketObject, StateSource};
pub use trade_history::TradeHistory;
