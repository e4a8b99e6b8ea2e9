//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the `TradeHistory` port over append-only JSONL files.
//! No database dependency, lightweight and crash-recoverable.

pub mod trades;

pub use trades::TradeLog;
