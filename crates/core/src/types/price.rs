//! Type-safe price representation using decimal arithmetic.
//!
//! All money in the store is Indian rupees held as [`Decimal`] with two
//! fractional digits (paise). Amounts are never stored as floats.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a rupee price, rounded half-up to paise.
    #[must_use]
    pub fn inr(amount: Decimal) -> Self {
        Self::new(round_money(amount), CurrencyCode::INR)
    }

    /// Format for display using Indian digit grouping, e.g. `₹1,23,456.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let amount = round_money(self.amount);
        let sign = if amount.is_sign_negative() && !amount.is_zero() {
            "-"
        } else {
            ""
        };
        let text = format!("{:.2}", amount.abs());
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        format!(
            "{sign}{}{}.{fraction}",
            self.currency_code.symbol(),
            group_indian(whole)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Currency symbol used in display strings.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }
}

/// Round an amount to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Group an unsigned digit string the Indian way: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::inr(dec("0")).display(), "₹0.00");
        assert_eq!(Price::inr(dec("99")).display(), "₹99.00");
        assert_eq!(Price::inr(dec("999.5")).display(), "₹999.50");
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(Price::inr(dec("1000")).display(), "₹1,000.00");
        assert_eq!(Price::inr(dec("123456")).display(), "₹1,23,456.00");
        assert_eq!(Price::inr(dec("12345678.9")).display(), "₹1,23,45,678.90");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::inr(dec("-1500")).display(), "-₹1,500.00");
    }

    #[test]
    fn test_inr_rounds_to_paise() {
        assert_eq!(Price::inr(dec("10.005")).amount, dec("10.01"));
        assert_eq!(Price::inr(dec("10.004")).amount, dec("10.00"));
    }
}
