//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the service's workflows. Each use case is a self-contained
//! operation.
//!
//! Use cases:
//! - `state_reader`: Market snapshot assembly from a `StateSource`
//! - `QuoteService`: Buy/sell quotes, position and portfolio PnL
//! - `PortfolioMonitor`: Periodic mark-to-market of open positions

pub mod portfolio_monitor;
pub mod quote_service;
pub mod state_reader;

pub use portfolio_monitor::PortfolioMonitor;
pub use quote_service::QuoteService;
pub use state_reader::get_market_state;
