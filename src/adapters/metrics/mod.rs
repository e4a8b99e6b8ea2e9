//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics and the health endpoints (/live, /ready,
//! /metrics) served by axum 0.7.

pub mod health;
pub mod prometheus;

pub use self::health::{HealthServer, HealthState};
pub use self::prometheus::QuoteMetrics;
