//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, file I/O). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `rpc`: Ledger JSON-RPC client and `StateSource` implementation
//! - `snapshot`: JSON file `StateSource` for offline quoting
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSONL trade logging

pub mod metrics;
pub mod persistence;
pub mod rpc;
pub mod snapshot;
