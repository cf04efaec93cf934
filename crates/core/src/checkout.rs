//! Cart quantity rules and checkout totals.
//!
//! ```text
//! subtotal = Σ unit_price × quantity
//! shipping = 0 if cart empty or subtotal ≥ free_threshold, else flat_fee
//! total    = max(0, subtotal + shipping − exchange_discount)
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::price::round_money;

/// Errors raised while computing checkout totals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A line carried a negative unit price.
    #[error("unit price cannot be negative")]
    NegativePrice,
    /// The exchange discount was negative.
    #[error("exchange discount cannot be negative")]
    NegativeDiscount,
}

/// A cart line quantity. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartQuantity(i32);

impl CartQuantity {
    /// The smallest quantity a cart line can hold.
    pub const MIN: i32 = 1;

    /// Clamp a requested quantity so it never drops below one.
    #[must_use]
    pub const fn clamped(requested: i32) -> Self {
        if requested < Self::MIN {
            Self(Self::MIN)
        } else {
            Self(requested)
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Add another quantity, saturating at `i32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Default for CartQuantity {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Fee charged below the threshold.
    pub flat_fee: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Decimal,
}

impl ShippingPolicy {
    /// Shipping charge for a given subtotal.
    #[must_use]
    pub fn charge_for(&self, subtotal: Decimal, item_count: usize) -> Decimal {
        if item_count == 0 || subtotal >= self.free_threshold {
            Decimal::ZERO
        } else {
            self.flat_fee
        }
    }
}

/// A priced line going into checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: CartQuantity,
}

impl PricedLine {
    /// `unit_price × quantity`, rounded to paise.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity.get()))
    }
}

/// Computed totals for a cart or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    /// Exchange credit actually applied (never more than subtotal + shipping).
    pub exchange_discount: Decimal,
    pub total: Decimal,
    pub item_count: i32,
}

impl CheckoutTotals {
    /// Compute totals for a set of lines.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if any price or the discount is negative.
    pub fn compute(
        lines: &[PricedLine],
        policy: &ShippingPolicy,
        exchange_discount: Decimal,
    ) -> Result<Self, CheckoutError> {
        if exchange_discount.is_sign_negative() && !exchange_discount.is_zero() {
            return Err(CheckoutError::NegativeDiscount);
        }
        if lines
            .iter()
            .any(|l| l.unit_price.is_sign_negative() && !l.unit_price.is_zero())
        {
            return Err(CheckoutError::NegativePrice);
        }

        let subtotal = lines
            .iter()
            .map(PricedLine::line_total)
            .fold(Decimal::ZERO, |acc, t| acc + t);
        let item_count = lines
            .iter()
            .fold(0_i32, |acc, l| acc.saturating_add(l.quantity.get()));
        let shipping = policy.charge_for(subtotal, lines.len());
        let gross = subtotal + shipping;
        let applied = round_money(exchange_discount).min(gross);

        Ok(Self {
            subtotal,
            shipping,
            exchange_discount: applied,
            total: gross - applied,
            item_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            flat_fee: Decimal::new(99, 0),
            free_threshold: Decimal::new(5000, 0),
        }
    }

    fn line(price: i64, qty: i32) -> PricedLine {
        PricedLine {
            unit_price: Decimal::new(price, 0),
            quantity: CartQuantity::clamped(qty),
        }
    }

    #[test]
    fn test_quantity_never_below_one() {
        assert_eq!(CartQuantity::clamped(0).get(), 1);
        assert_eq!(CartQuantity::clamped(-5).get(), 1);
        assert_eq!(CartQuantity::clamped(3).get(), 3);
        assert_eq!(CartQuantity::default().get(), 1);
    }

    #[test]
    fn test_totals_below_free_shipping() {
        let totals = CheckoutTotals::compute(&[line(1200, 2)], &policy(), Decimal::ZERO).unwrap();
        assert_eq!(totals.subtotal, Decimal::new(2400, 0));
        assert_eq!(totals.shipping, Decimal::new(99, 0));
        assert_eq!(totals.total, Decimal::new(2499, 0));
        assert_eq!(totals.item_count, 2);
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let totals = CheckoutTotals::compute(&[line(5000, 1)], &policy(), Decimal::ZERO).unwrap();
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(5000, 0));
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = CheckoutTotals::compute(&[], &policy(), Decimal::ZERO).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_exchange_discount_reduces_total() {
        let totals =
            CheckoutTotals::compute(&[line(10_000, 1)], &policy(), Decimal::new(3500, 0)).unwrap();
        assert_eq!(totals.total, Decimal::new(6500, 0));
        assert_eq!(totals.exchange_discount, Decimal::new(3500, 0));
    }

    #[test]
    fn test_total_floored_at_zero() {
        let totals =
            CheckoutTotals::compute(&[line(1000, 1)], &policy(), Decimal::new(50_000, 0)).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
        // Applied credit is capped at subtotal + shipping
        assert_eq!(totals.exchange_discount, Decimal::new(1099, 0));
        assert_eq!(
            totals.subtotal + totals.shipping - totals.exchange_discount,
            totals.total
        );
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert_eq!(
            CheckoutTotals::compute(&[line(100, 1)], &policy(), Decimal::new(-1, 0)),
            Err(CheckoutError::NegativeDiscount)
        );
        assert_eq!(
            CheckoutTotals::compute(&[line(-100, 1)], &policy(), Decimal::ZERO),
            Err(CheckoutError::NegativePrice)
        );
    }
}
