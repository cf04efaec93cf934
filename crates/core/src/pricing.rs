//! Metal valuation helpers.
//!
//! Market rates are quoted per gram for a specific purity grade (the 22K rate,
//! the 925 silver rate, ...), so no fineness conversion happens here.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::types::price::round_money;

/// Largest deduction an appraiser may configure, in percent.
pub const MAX_DEDUCTION_PERCENT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("value is too large to price")]
    Overflow,
}

/// Value of `weight_grams` of metal at `rate_per_gram`, rounded to paise.
///
/// # Errors
///
/// Returns `PricingError::Overflow` if the value does not fit a `Decimal`.
pub fn metal_value(
    weight_grams: Decimal,
    rate_per_gram: Decimal,
) -> Result<Decimal, PricingError> {
    weight_grams
        .checked_mul(rate_per_gram)
        .map(round_money)
        .ok_or(PricingError::Overflow)
}

/// Indicative credit for old jewelry before an admin appraises it.
///
/// The metal value is reduced by `deduction_percent` to cover melting and
/// testing losses.
///
/// # Errors
///
/// Returns `PricingError::Overflow` if the value does not fit a `Decimal`.
pub fn exchange_estimate(
    weight_grams: Decimal,
    rate_per_gram: Decimal,
    deduction_percent: u32,
) -> Result<Decimal, PricingError> {
    let deduction = Decimal::from(deduction_percent.min(MAX_DEDUCTION_PERCENT));
    let keep = (Decimal::ONE_HUNDRED - deduction) / Decimal::ONE_HUNDRED;
    weight_grams
        .checked_mul(rate_per_gram)
        .and_then(|value| value.checked_mul(keep))
        .map(round_money)
        .ok_or(PricingError::Overflow)
}

/// Grams of metal an amount buys at `rate_per_gram`, truncated to 4 dp so the
/// store never credits more metal than was paid for.
///
/// Returns zero for a non-positive rate.
///
/// # Errors
///
/// Returns `PricingError::Overflow` if the quotient does not fit a `Decimal`.
pub fn grams_for_amount(
    amount: Decimal,
    rate_per_gram: Decimal,
) -> Result<Decimal, PricingError> {
    if rate_per_gram <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    amount
        .checked_div(rate_per_gram)
        .map(|grams| grams.round_dp_with_strategy(4, RoundingStrategy::ToZero))
        .ok_or(PricingError::Overflow)
}
