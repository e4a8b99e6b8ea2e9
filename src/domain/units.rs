//! Fixed-point unit helpers.
//!
//! Settlement currency and share counts are integers with six implied
//! decimals ("micro-units"). Decimal values only appear at the display
//! edge, so the conversions live here and nowhere else.

use rust_decimal::prelude::*;

use super::error::PricingError;

/// Number of micro-units in one display unit.
pub const MICRO_UNITS_PER_UNIT: u128 = 1_000_000;

/// Implied decimal places of a micro-unit amount.
pub const MICRO_UNIT_SCALE: u32 = 6;

/// Convert a display value (e.g. `12.5` USDC) into micro-units.
///
/// Rounds half away from zero at the sixth decimal.
///
/// # Errors
/// `InvalidInput` for negative values, `ComputationFailure` when the
/// scaled value does not fit.
pub fn to_micro_units(value: Decimal) -> Result<u128, PricingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PricingError::invalid(format!(
            "amount must not be negative, got {value}"
        )));
    }

    let scaled = value
        .checked_mul(Decimal::from(1_000_000u32))
        .ok_or_else(|| PricingError::computation(format!("{value} overflows micro-units")))?;

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u128()
        .ok_or_else(|| PricingError::computation(format!("{value} overflows micro-units")))
}

/// Convert micro-units back into an exact display decimal.
///
/// # Errors
/// `ComputationFailure` if the amount exceeds the 96-bit decimal mantissa.
pub fn from_micro_units(micros: u128) -> Result<Decimal, PricingError> {
    let signed = i128::try_from(micros)
        .map_err(|_| PricingError::computation(format!("{micros} exceeds decimal range")))?;
    signed_micro_to_decimal(signed)
}

/// Signed variant of [`from_micro_units`], used for PnL figures.
///
/// # Errors
/// `ComputationFailure` if the amount exceeds the 96-bit decimal mantissa.
pub fn signed_micro_to_decimal(micros: i128) -> Result<Decimal, PricingError> {
    Decimal::try_from_i128_with_scale(micros, MICRO_UNIT_SCALE)
        .map_err(|e| PricingError::computation(format!("{micros} exceeds decimal range: {e}")))
}

/// Format a display value as currency: `$1,234.57`, `-$0.50`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = format!("{:.2}", rounded.abs());
    let (whole, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let sign = if negative { "-" } else { "" };
    format!("{sign}${}.{frac}", group_thousands(whole))
}

/// Format a signed micro-unit amount as currency.
pub fn format_micro_currency(micros: i128) -> String {
    match signed_micro_to_decimal(micros) {
        Ok(value) => format_currency(value),
        Err(_) => format!("{micros} micro-units"),
    }
}

/// Format a percentage value (already scaled to 0–100) with two decimals.
pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}%")
    } else {
        "0.00%".to_string()
    }
}

fn group_thousands(whole: &str) -> String {
    let mut out = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
