//! Amount → shares solver.
//!
//! Inverts the LMSR cost function with a bounded binary search followed
//! by a linear refinement pass. The inverse has no closed form once
//! inactive buckets can enter the sum, so the search trades exactness
//! for a fixed evaluation budget. Every tunable lives in
//! [`SolverConfig`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::buckets::BucketRange;
use super::error::PricingError;
use super::lmsr::LmsrEngine;
use super::market_state::MarketState;

/// Tunables of the bounded binary search with linear refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Binary-search iteration cap.
    pub max_iterations: u32,
    /// Stop searching once cost/amount reaches this utilization.
    pub target_utilization: f64,
    /// Refinement runs when the best utilization is in [floor, target).
    pub refine_utilization_floor: f64,
    /// Total shares the refinement pass may add on top of the search result.
    pub refine_window: u64,
    /// Increment of each refinement step.
    pub refine_step: u64,
    /// Multiplier applied to the probability-weighted share estimate.
    pub seed_headroom: f64,
    /// Price floor used when seeding from a near-zero probability.
    pub min_seed_price: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            target_utilization: 0.99,
            refine_utilization_floor: 0.95,
            refine_window: 10_000,
            refine_step: 100,
            seed_headroom: 2.0,
            min_seed_price: 0.01,
        }
    }
}

impl SolverConfig {
    /// Reject tunables the search cannot work with.
    ///
    /// # Errors
    /// `InvalidInput` describing the first offending field.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.max_iterations == 0 {
            return Err(PricingError::invalid("solver max_iterations must be positive"));
        }
        if !(self.target_utilization > 0.0 && self.target_utilization <= 1.0) {
            return Err(PricingError::invalid(format!(
                "solver target_utilization must be in (0, 1], got {}",
                self.target_utilization
            )));
        }
        if !(self.refine_utilization_floor > 0.0
            && self.refine_utilization_floor <= self.target_utilization)
        {
            return Err(PricingError::invalid(format!(
                "solver refine_utilization_floor must be in (0, target], got {}",
                self.refine_utilization_floor
            )));
        }
        if self.refine_step == 0 || self.refine_window < self.refine_step {
            return Err(PricingError::invalid(
                "solver refine_step must be positive and not exceed refine_window",
            ));
        }
        if !(self.seed_headroom >= 1.0 && self.seed_headroom.is_finite()) {
            return Err(PricingError::invalid("solver seed_headroom must be >= 1"));
        }
        if !(self.min_seed_price > 0.0 && self.min_seed_price <= 1.0) {
            return Err(PricingError::invalid("solver min_seed_price must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Result of a solve: shares affordable and what they cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolvedShares {
    pub shares: u128,
    pub cost: u128,
}

/// Finds the largest share count whose cost fits a budget.
#[derive(Debug, Clone, Default)]
pub struct QuoteSolver {
    config: SolverConfig,
}

impl QuoteSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Largest found `shares` with `cost_to_buy(range, shares) <= amount`.
    ///
    /// Cost evaluation failures count as "too expensive". Returns
    /// `{0, 0}` when nothing positive is affordable.
    pub fn solve(&self, state: &MarketState, range: BucketRange, amount: u128) -> SolvedShares {
        if amount == 0 {
            return SolvedShares::default();
        }

        let engine = LmsrEngine::new(state);
        let mut low: u128 = 1;
        let mut high = self.upper_bound(&engine, range, amount);
        let mut best = SolvedShares::default();

        for iteration in 0..self.config.max_iterations {
            if low > high {
                break;
            }
            let mid = low + (high - low) / 2;

            match engine.cost_to_buy(range, mid) {
                Ok(cost) if cost <= amount => {
                    best = SolvedShares { shares: mid, cost };
                    if utilization(cost, amount) >= self.config.target_utilization {
                        debug!(iteration, shares = %mid, cost = %cost, "Solver reached target utilization");
                        break;
                    }
                    low = mid + 1;
                }
                Ok(_) => high = mid - 1,
                Err(e) => {
                    debug!(iteration, shares = %mid, error = %e, "Cost evaluation failed, narrowing down");
                    high = mid - 1;
                }
            }
        }

        if best.shares > 0 {
            let used = utilization(best.cost, amount);
            if used >= self.config.refine_utilization_floor
                && used < self.config.target_utilization
            {
                best = self.refine(&engine, range, amount, best);
            }
        }

        debug!(
            amount = %amount,
            shares = %best.shares,
            cost = %best.cost,
            "Solver finished"
        );
        best
    }

    /// Walk upward in fixed steps to close the gap the search leaves.
    fn refine(
        &self,
        engine: &LmsrEngine<'_>,
        range: BucketRange,
        amount: u128,
        mut best: SolvedShares,
    ) -> SolvedShares {
        let step = u128::from(self.config.refine_step);
        let window = u128::from(self.config.refine_window);
        let cap = engine.state().max_shares_per_bucket();
        let base = best.shares;

        let mut extra = step;
        while extra <= window {
            let candidate = base.saturating_add(extra);
            if candidate > cap {
                break;
            }
            match engine.cost_to_buy(range, candidate) {
                Ok(cost) if cost <= amount => best = SolvedShares { shares: candidate, cost },
                _ => break,
            }
            extra += step;
        }
        best
    }

    /// Seed the search from amount / price, capped per bucket.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn upper_bound(&self, engine: &LmsrEngine<'_>, range: BucketRange, amount: u128) -> u128 {
        let cap = engine.state().max_shares_per_bucket().max(1);
        let price = (engine.probability(range) / 100.0).max(self.config.min_seed_price);
        let estimate = (amount as f64 / price * self.config.seed_headroom).ceil();

        if estimate.is_finite() && estimate < cap as f64 {
            (estimate as u128).max(1)
        } else {
            cap
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn utilization(cost: u128, amount: u128) -> f64 {
    cost as f64 / amount as f64
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::market_state::MarketParams;

    fn market(distribution: &[(i64, u128)], cap: Option<u128>) -> MarketState {
        MarketState::new(MarketParams {
            distribution: distribution.iter().copied().collect::<BTreeMap<_, _>>(),
            alpha: 10_000_000,
            balance: 0,
            min_value: 0,
            max_value: 1_000,
            bucket_width: 100,
            max_shares_per_bucket: cap,
        })
        .unwrap()
    }

    fn range(start: i64, end: i64) -> BucketRange {
        BucketRange { start, end }
    }

    #[test]
    fn test_zero_amount_buys_nothing() {
        let state = market(&[(0, 0), (1, 0)], None);
        let solved = QuoteSolver::default().solve(&state, range(0, 0), 0);
        assert_eq!(solved, SolvedShares::default());
    }

    #[test]
    fn test_solution_respects_budget_and_uses_it() {
        let state = market(&[(0, 0), (1, 0), (2, 0), (3, 0)], None);
        let solver = QuoteSolver::default();
        let amount = 1_000_000;
        let solved = solver.solve(&state, range(1, 1), amount);

        assert!(solved.shares > 0);
        assert!(solved.cost <= amount);
        assert!(
            utilization(solved.cost, amount) >= 0.95,
            "poor utilization: {} of {amount}",
            solved.cost
        );
        let engine = LmsrEngine::new(&state);
        assert_eq!(engine.cost_to_buy(range(1, 1), solved.shares).unwrap(), solved.cost);
    }

    #[test]
    fn test_cap_limits_shares() {
        let state = market(&[(0, 0), (1, 0)], Some(500));
        let solved = QuoteSolver::default().solve(&state, range(0, 0), 10_000_000);
        assert!(solved.shares <= 500);
        assert!(solved.shares > 0);
    }

    #[test]
    fn test_empty_market_yields_nothing() {
        let state = market(&[], None);
        let solved = QuoteSolver::default().solve(&state, range(0, 0), 1_000_000);
        assert_eq!(solved, SolvedShares::default());
    }

    #[test]
    fn test_unaffordable_entry_yields_nothing() {
        // nine inactive buckets enter the sum at once: the entry jump alone
        // costs alpha · ln(1 + 9) ≫ 1 micro-unit
        let state = market(&[(0, 0)], None);
        let solved = QuoteSolver::default().solve(&state, range(1, 9), 1);
        assert_eq!(solved, SolvedShares::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let bad = SolverConfig {
            refine_utilization_floor: 0.999,
            ..SolverConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = SolverConfig {
            refine_step: 0,
            ..SolverConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = SolverConfig {
            max_iterations: 0,
            ..SolverConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
