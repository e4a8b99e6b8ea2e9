//! Ledger RPC Adapters
//!
//! JSON-RPC transport and the `StateSource` implementation built on it.

pub mod client;
pub mod ledger;
pub mod types;

pub use client::{RpcClient, RpcClientConfig};
pub use ledger::LedgerStateSource;
