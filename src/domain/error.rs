//! Pricing error taxonomy.
//!
//! Every fallible pricing operation returns `PricingError`. The variants
//! map one-to-one onto the status codes the HTTP layer exposes, so a
//! caller never has to inspect message strings.

use thiserror::Error;

/// Errors produced by the pricing core and the quote façade.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The market does not exist or its on-ledger object is malformed.
    #[error("market not found: {0}")]
    NotFound(String),

    /// Caller-supplied parameters are invalid (checked before any read).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Numeric evaluation failed (overflow, NaN, empty sum).
    #[error("computation failure: {0}")]
    ComputationFailure(String),

    /// The state source failed; passed through unchanged, never retried here.
    #[error("state source error: {0:#}")]
    StateSource(#[source] anyhow::Error),

    /// A batch computation was aborted through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

impl PricingError {
    /// HTTP status the outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::ComputationFailure(_) => 500,
            Self::StateSource(_) => 502,
            Self::Cancelled => 499,
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::ComputationFailure(_) => "computation_failure",
            Self::StateSource(_) => "state_source",
            Self::Cancelled => "cancelled",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn computation(msg: impl Into<String>) -> Self {
        Self::ComputationFailure(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PricingError::NotFound("m".into()).status_code(), 404);
        assert_eq!(PricingError::invalid("bad").status_code(), 400);
        assert_eq!(PricingError::computation("nan").status_code(), 500);
        assert_eq!(
            PricingError::StateSource(anyhow::anyhow!("rpc down")).status_code(),
            502
        );
    }

    #[test]
    fn test_state_source_message_keeps_context() {
        let err = PricingError::StateSource(
            anyhow::anyhow!("connection reset").context("sui_getObject failed"),
        );
        let msg = err.to_string();
        assert!(msg.contains("sui_getObject failed"));
        assert!(msg.contains("connection reset"));
    }
}
