//! Logarithmic Market Scoring Rule (LMSR) over a sparse bucket domain.
//!
//! Cost function: C(q) = α · ln(Σ exp(q_i / α)).
//! Reference: Hanson (2003) "Combinatorial Information Market Design"
//!
//! A range bet adds the *same* share count to every bucket of the range
//! (it is not split among them). Sums run over the active-bucket set
//! only, mirroring the on-ledger cost model; in-range buckets that are
//! not active yet all carry the identical term exp(shares / α) and are
//! folded into a single weighted term, so evaluation stays O(|active|)
//! however wide the range is.
//!
//! Exponentials and logarithms are evaluated in f64 through a max-shifted
//! log-sum-exp. Results are integers in micro-units: costs round to
//! nearest, payouts round down.

use super::buckets::BucketRange;
use super::error::PricingError;
use super::market_state::MarketState;

/// One `weight · exp(exponent)` summand.
#[derive(Debug, Clone, Copy)]
struct Term {
    exponent: f64,
    weight: f64,
}

impl Term {
    fn single(exponent: f64) -> Self {
        Self {
            exponent,
            weight: 1.0,
        }
    }
}

/// ln(Σ wᵢ·exp(xᵢ)), or `None` for an empty or non-finite sum.
fn log_sum_exp<'a, I>(terms: I) -> Option<f64>
where
    I: Iterator<Item = &'a Term> + Clone,
{
    let max = terms
        .clone()
        .filter(|t| t.weight > 0.0)
        .map(|t| t.exponent)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }

    let scaled: f64 = terms
        .filter(|t| t.weight > 0.0)
        .map(|t| t.weight * (t.exponent - max).exp())
        .sum();
    let result = max + scaled.ln();
    result.is_finite().then_some(result)
}

/// Terms of a hypothetical state, split by range membership.
#[derive(Debug, Default)]
struct SplitTerms {
    inside: Vec<Term>,
    outside: Vec<Term>,
}

impl SplitTerms {
    fn all(&self) -> impl Iterator<Item = &Term> + Clone {
        self.inside.iter().chain(self.outside.iter())
    }

    /// Share of the total mass that sits inside the range, in percent.
    fn inside_percent(&self) -> f64 {
        let Some(total) = log_sum_exp(self.all()) else {
            return 0.0;
        };
        let Some(inside) = log_sum_exp(self.inside.iter()) else {
            return 0.0;
        };
        ((inside - total).exp() * 100.0).clamp(0.0, 100.0)
    }
}

/// Rounding applied when turning α·Δln into micro-units.
#[derive(Debug, Clone, Copy)]
enum Rounding {
    Nearest,
    Down,
}

/// Pure LMSR evaluator over a borrowed market snapshot.
#[derive(Debug, Clone, Copy)]
pub struct LmsrEngine<'a> {
    state: &'a MarketState,
    alpha: f64,
}

impl<'a> LmsrEngine<'a> {
    /// Create an engine over `state`.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(state: &'a MarketState) -> Self {
        Self {
            state,
            alpha: state.alpha() as f64,
        }
    }

    pub fn state(&self) -> &'a MarketState {
        self.state
    }

    #[allow(clippy::cast_precision_loss)]
    fn exponent(&self, shares: u128) -> f64 {
        shares as f64 / self.alpha
    }

    /// Current probability (0–100) that the outcome lands in `range`.
    ///
    /// Returns 0 for an empty market or a range without active buckets.
    pub fn probability(&self, range: BucketRange) -> f64 {
        self.current_terms(range).inside_percent()
    }

    /// Probability of `range` after buying `shares` into every bucket of it.
    ///
    /// # Errors
    /// `ComputationFailure` on share overflow.
    pub fn probability_after_buy(
        &self,
        range: BucketRange,
        shares: u128,
    ) -> Result<f64, PricingError> {
        Ok(self.buy_terms(range, shares)?.inside_percent())
    }

    /// Probability of `range` after selling `shares` out of every bucket of it.
    pub fn probability_after_sell(&self, range: BucketRange, shares: u128) -> f64 {
        self.sell_terms(range, shares).inside_percent()
    }

    /// Collateral needed to add `shares` to every bucket in `range`.
    ///
    /// cost = α · (ln F − ln I), I over the active set, F over
    /// active ∪ range after the trade. Rounded to nearest.
    ///
    /// # Errors
    /// `ComputationFailure` for an empty market, share overflow or a
    /// non-finite result.
    pub fn cost_to_buy(&self, range: BucketRange, shares: u128) -> Result<u128, PricingError> {
        if shares == 0 {
            return Ok(0);
        }
        let initial = self.initial_log_sum()?;
        let after = self.buy_terms(range, shares)?;
        let fin = log_sum_exp(after.all())
            .ok_or_else(|| PricingError::computation("post-trade sum is not finite"))?;

        self.to_micro_units(fin - initial, Rounding::Nearest)
    }

    /// Collateral returned for removing `shares` from every bucket in `range`.
    ///
    /// payout = α · (ln I − ln F). In-range buckets floor at zero and an
    /// emptied bucket keeps its exp(0) term in F. Rounded down, and never
    /// above the cost of buying the same shares on the same state.
    ///
    /// # Errors
    /// `ComputationFailure` for an empty market or a non-finite result.
    pub fn payout_for_sell(
        &self,
        range: BucketRange,
        shares: u128,
    ) -> Result<u128, PricingError> {
        if shares == 0 {
            return Ok(0);
        }
        let initial = self.initial_log_sum()?;
        let after = self.sell_terms(range, shares);
        let fin = log_sum_exp(after.all())
            .ok_or_else(|| PricingError::computation("post-sell sum is not finite"))?;

        self.to_micro_units(initial - fin, Rounding::Down)
    }

    fn initial_log_sum(&self) -> Result<f64, PricingError> {
        let terms: Vec<Term> = self
            .state
            .distribution()
            .values()
            .map(|&q| Term::single(self.exponent(q)))
            .collect();
        log_sum_exp(terms.iter())
            .ok_or_else(|| PricingError::computation("market has no active buckets"))
    }

    fn current_terms(&self, range: BucketRange) -> SplitTerms {
        let mut split = SplitTerms::default();
        for (&bucket, &q) in self.state.distribution() {
            let term = Term::single(self.exponent(q));
            if range.contains(bucket) {
                split.inside.push(term);
            } else {
                split.outside.push(term);
            }
        }
        split
    }

    #[allow(clippy::cast_precision_loss)]
    fn buy_terms(&self, range: BucketRange, shares: u128) -> Result<SplitTerms, PricingError> {
        let mut split = SplitTerms::default();
        let mut active_in_range: u64 = 0;

        for (&bucket, &q) in self.state.distribution() {
            if range.contains(bucket) {
                let next = q.checked_add(shares).ok_or_else(|| {
                    PricingError::computation(format!("bucket {bucket} share overflow"))
                })?;
                split.inside.push(Term::single(self.exponent(next)));
                active_in_range += 1;
            } else {
                split.outside.push(Term::single(self.exponent(q)));
            }
        }

        let untouched = range.len().saturating_sub(active_in_range);
        if untouched > 0 {
            split.inside.push(Term {
                exponent: self.exponent(shares),
                weight: untouched as f64,
            });
        }
        Ok(split)
    }

    /// Emptied buckets stay in the sum as exp(0), the weight they had
    /// entering it, so a sell can never release more than the curve holds.
    fn sell_terms(&self, range: BucketRange, shares: u128) -> SplitTerms {
        let mut split = SplitTerms::default();
        for (&bucket, &q) in self.state.distribution() {
            if range.contains(bucket) {
                let left = q.saturating_sub(shares);
                split.inside.push(Term::single(self.exponent(left)));
            } else {
                split.outside.push(Term::single(self.exponent(q)));
            }
        }
        split
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn to_micro_units(&self, log_delta: f64, rounding: Rounding) -> Result<u128, PricingError> {
        let value = self.alpha * log_delta;
        if !value.is_finite() || value >= u128::MAX as f64 {
            return Err(PricingError::computation(format!(
                "LMSR result out of range: {value}"
            )));
        }
        // float noise on a zero-sized move
        if value <= 0.0 {
            return Ok(0);
        }
        let rounded = match rounding {
            Rounding::Nearest => value.round(),
            Rounding::Down => value.floor(),
        };
        Ok(rounded as u128)
    }
}
