//! Gullak recurring savings plans.
//!
//! A plan collects fixed installments on a daily, weekly, or monthly schedule
//! and converts each one into grams of metal at the rate of the day. It
//! completes when the accumulated weight reaches the target.
//!
//! Monthly plans remember the day of month they started on (the anchor day), so
//! a plan started on the 31st falls due on Feb 28/29 and then on Mar 31 again
//! rather than drifting to the 28th for good.

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{PricingError, grams_for_amount};
use crate::types::{GullakStatus, PaymentFrequency};

/// Smallest installment the store accepts, in rupees.
pub const MIN_INSTALLMENT: Decimal = Decimal::ONE_HUNDRED;

/// Longest schedule a projection will walk.
pub const MAX_PROJECTED_INSTALLMENTS: u32 = 3660;

/// Errors raised by Gullak plan operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GullakError {
    #[error("target weight must be greater than zero")]
    InvalidTarget,
    #[error("installment must be at least {min}")]
    InstallmentTooSmall { min: Decimal },
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,
    #[error("market rate must be greater than zero")]
    InvalidRate,
    #[error("plan is {0}, expected {1}")]
    WrongStatus(GullakStatus, GullakStatus),
    #[error("plan would need more than {MAX_PROJECTED_INSTALLMENTS} installments")]
    TooManyInstallments,
    #[error("date out of range")]
    DateOverflow,
    #[error("amount is too large for this plan")]
    Overflow,
}

/// Next due date after `date`.
///
/// Returns `None` only when the result is past the supported calendar range.
#[must_use]
pub fn advance(date: NaiveDate, frequency: PaymentFrequency, anchor_day: u32) -> Option<NaiveDate> {
    match frequency {
        PaymentFrequency::Daily => date.checked_add_days(Days::new(1)),
        PaymentFrequency::Weekly => date.checked_add_days(Days::new(7)),
        PaymentFrequency::Monthly => {
            let next_month = date
                .with_day(1)?
                .checked_add_months(Months::new(1))?;
            let day = anchor_day.clamp(1, days_in_month(next_month)?);
            next_month.with_day(day)
        }
    }
}

/// Advance `date` until it is on or after `today`.
#[must_use]
pub fn roll_forward(
    date: NaiveDate,
    frequency: PaymentFrequency,
    anchor_day: u32,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let mut current = date;
    while current < today {
        current = advance(current, frequency, anchor_day)?;
    }
    Some(current)
}

/// Number of days in the month containing `date`.
fn days_in_month(date: NaiveDate) -> Option<u32> {
    let first = date.with_day(1)?;
    let next = first.checked_add_months(Months::new(1))?;
    let last = next.pred_opt()?;
    Some(last.day())
}

impl From<PricingError> for GullakError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Overflow => Self::Overflow,
        }
    }
}

/// The mutable state of a savings plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GullakPlan {
    pub target_grams: Decimal,
    pub installment_amount: Decimal,
    pub frequency: PaymentFrequency,
    pub anchor_day: u32,
    pub next_payment_date: Option<NaiveDate>,
    pub installments_paid: i32,
    pub total_paid: Decimal,
    pub accumulated_grams: Decimal,
    pub status: GullakStatus,
}

impl GullakPlan {
    /// Open a new plan with its first installment due on `start_date`.
    ///
    /// # Errors
    ///
    /// Returns `GullakError` if the target or installment is out of range.
    pub fn open(
        target_grams: Decimal,
        installment_amount: Decimal,
        frequency: PaymentFrequency,
        start_date: NaiveDate,
    ) -> Result<Self, GullakError> {
        if target_grams <= Decimal::ZERO {
            return Err(GullakError::InvalidTarget);
        }
        if installment_amount < MIN_INSTALLMENT {
            return Err(GullakError::InstallmentTooSmall {
                min: MIN_INSTALLMENT,
            });
        }

        Ok(Self {
            target_grams,
            installment_amount,
            frequency,
            anchor_day: start_date.day(),
            next_payment_date: Some(start_date),
            installments_paid: 0,
            total_paid: Decimal::ZERO,
            accumulated_grams: Decimal::ZERO,
            status: GullakStatus::Active,
        })
    }

    /// Record a payment converted at `rate_per_gram`.
    ///
    /// Returns the updated plan and the grams credited by this payment.
    ///
    /// # Errors
    ///
    /// Returns `GullakError` if the plan is not active, the amount or rate
    /// is not positive, or the running totals overflow.
    pub fn apply_payment(
        &self,
        amount: Decimal,
        rate_per_gram: Decimal,
    ) -> Result<(Self, Decimal), GullakError> {
        self.expect_status(GullakStatus::Active)?;
        if amount <= Decimal::ZERO {
            return Err(GullakError::NonPositiveAmount);
        }
        if rate_per_gram <= Decimal::ZERO {
            return Err(GullakError::InvalidRate);
        }

        let grams = grams_for_amount(amount, rate_per_gram)?;
        let mut next = self.clone();
        next.total_paid = self
            .total_paid
            .checked_add(amount)
            .ok_or(GullakError::Overflow)?;
        next.accumulated_grams = self
            .accumulated_grams
            .checked_add(grams)
            .ok_or(GullakError::Overflow)?;
        next.installments_paid = next.installments_paid.saturating_add(1);

        if next.accumulated_grams >= next.target_grams {
            next.status = GullakStatus::Completed;
            next.next_payment_date = None;
        } else if let Some(due) = self.next_payment_date {
            next.next_payment_date =
                Some(advance(due, self.frequency, self.anchor_day).ok_or(GullakError::DateOverflow)?);
        }

        Ok((next, grams))
    }

    /// Pause an active plan.
    ///
    /// # Errors
    ///
    /// Returns `GullakError::WrongStatus` unless the plan is active.
    pub fn pause(&self) -> Result<Self, GullakError> {
        self.expect_status(GullakStatus::Active)?;
        Ok(Self {
            status: GullakStatus::Paused,
            ..self.clone()
        })
    }

    /// Resume a paused plan. Installments missed while paused are skipped.
    ///
    /// # Errors
    ///
    /// Returns `GullakError::WrongStatus` unless the plan is paused.
    pub fn resume(&self, today: NaiveDate) -> Result<Self, GullakError> {
        self.expect_status(GullakStatus::Paused)?;
        let next_payment_date = match self.next_payment_date {
            Some(due) => Some(
                roll_forward(due, self.frequency, self.anchor_day, today)
                    .ok_or(GullakError::DateOverflow)?,
            ),
            None => Some(today),
        };
        Ok(Self {
            status: GullakStatus::Active,
            next_payment_date,
            ..self.clone()
        })
    }

    /// Progress toward the target, in percent (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> Decimal {
        if self.target_grams <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.accumulated_grams
            .checked_div(self.target_grams)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |percent| percent.min(Decimal::ONE_HUNDRED))
            .round_dp(2)
    }

    fn expect_status(&self, expected: GullakStatus) -> Result<(), GullakError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(GullakError::WrongStatus(self.status, expected))
        }
    }
}

/// What it takes to reach a target at today's rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub installments_needed: u32,
    pub estimated_cost: Decimal,
    pub completion_date: NaiveDate,
}

/// Project a plan's length assuming the rate stays where it is.
///
/// # Errors
///
/// Returns `GullakError` for invalid inputs or a schedule longer than
/// [`MAX_PROJECTED_INSTALLMENTS`].
pub fn project(
    target_grams: Decimal,
    rate_per_gram: Decimal,
    installment_amount: Decimal,
    frequency: PaymentFrequency,
    start_date: NaiveDate,
) -> Result<Projection, GullakError> {
    if target_grams <= Decimal::ZERO {
        return Err(GullakError::InvalidTarget);
    }
    if rate_per_gram <= Decimal::ZERO {
        return Err(GullakError::InvalidRate);
    }
    if installment_amount < MIN_INSTALLMENT {
        return Err(GullakError::InstallmentTooSmall {
            min: MIN_INSTALLMENT,
        });
    }

    let estimated_cost = target_grams
        .checked_mul(rate_per_gram)
        .ok_or(GullakError::Overflow)?
        .round_dp(2);
    let needed = (estimated_cost / installment_amount).ceil();
    let installments_needed = needed
        .to_u32()
        .filter(|n| *n <= MAX_PROJECTED_INSTALLMENTS)
        .ok_or(GullakError::TooManyInstallments)?
        .max(1);

    let anchor_day = start_date.day();
    let mut completion_date = start_date;
    for _ in 1..installments_needed {
        completion_date =
            advance(completion_date, frequency, anchor_day).ok_or(GullakError::DateOverflow)?;
    }

    Ok(Projection {
        installments_needed,
        estimated_cost,
        completion_date,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_advance_daily_and_weekly() {
        assert_eq!(
            advance(date(2026, 2, 28), PaymentFrequency::Daily, 28),
            Some(date(2026, 3, 1))
        );
        assert_eq!(
            advance(date(2026, 12, 29), PaymentFrequency::Weekly, 29),
            Some(date(2027, 1, 5))
        );
    }

    #[test]
    fn test_monthly_keeps_anchor_day() {
        let jan = date(2026, 1, 31);
        let feb = advance(jan, PaymentFrequency::Monthly, 31).unwrap();
        assert_eq!(feb, date(2026, 2, 28));
        let mar = advance(feb, PaymentFrequency::Monthly, 31).unwrap();
        assert_eq!(mar, date(2026, 3, 31));
        let apr = advance(mar, PaymentFrequency::Monthly, 31).unwrap();
        assert_eq!(apr, date(2026, 4, 30));
    }

    #[test]
    fn test_monthly_leap_year() {
        assert_eq!(
            advance(date(2028, 1, 30), PaymentFrequency::Monthly, 30),
            Some(date(2028, 2, 29))
        );
    }

    #[test]
    fn test_roll_forward_skips_missed_dates() {
        let rolled = roll_forward(
            date(2026, 1, 15),
            PaymentFrequency::Monthly,
            15,
            date(2026, 4, 2),
        );
        assert_eq!(rolled, Some(date(2026, 4, 15)));
        // Already in the future: unchanged
        assert_eq!(
            roll_forward(date(2026, 5, 1), PaymentFrequency::Daily, 1, date(2026, 4, 2)),
            Some(date(2026, 5, 1))
        );
    }

    fn plan() -> GullakPlan {
        GullakPlan::open(
            Decimal::new(1, 0),
            Decimal::new(2000, 0),
            PaymentFrequency::Monthly,
            date(2026, 1, 31),
        )
        .unwrap()
    }

    #[test]
    fn test_open_validates_inputs() {
        assert_eq!(
            GullakPlan::open(
                Decimal::ZERO,
                Decimal::new(500, 0),
                PaymentFrequency::Weekly,
                date(2026, 1, 1)
            ),
            Err(GullakError::InvalidTarget)
        );
        assert!(matches!(
            GullakPlan::open(
                Decimal::new(5, 0),
                Decimal::new(99, 0),
                PaymentFrequency::Weekly,
                date(2026, 1, 1)
            ),
            Err(GullakError::InstallmentTooSmall { .. })
        ));
    }

    #[test]
    fn test_payment_accumulates_and_advances() {
        let (after, grams) = plan()
            .apply_payment(Decimal::new(2000, 0), Decimal::new(6000, 0))
            .unwrap();
        assert_eq!(grams, Decimal::new(3333, 4));
        assert_eq!(after.accumulated_grams, Decimal::new(3333, 4));
        assert_eq!(after.total_paid, Decimal::new(2000, 0));
        assert_eq!(after.installments_paid, 1);
        assert_eq!(after.next_payment_date, Some(date(2026, 2, 28)));
        assert_eq!(after.status, GullakStatus::Active);
    }

    #[test]
    fn test_plan_completes_at_target() {
        let mut current = plan();
        for _ in 0..3 {
            let (next, _) = current
                .apply_payment(Decimal::new(2000, 0), Decimal::new(6000, 0))
                .unwrap();
            current = next;
        }
        // 3 × 0.3333 = 0.9999 g, one more payment crosses 1 g
        assert_eq!(current.status, GullakStatus::Active);
        let (done, _) = current
            .apply_payment(Decimal::new(2000, 0), Decimal::new(6000, 0))
            .unwrap();
        assert_eq!(done.status, GullakStatus::Completed);
        assert_eq!(done.next_payment_date, None);
        assert_eq!(done.progress_percent(), Decimal::ONE_HUNDRED);

        assert!(matches!(
            done.apply_payment(Decimal::new(2000, 0), Decimal::new(6000, 0)),
            Err(GullakError::WrongStatus(GullakStatus::Completed, _))
        ));
    }

    #[test]
    fn test_pause_blocks_payments_and_resume_rolls_forward() {
        let paused = plan().pause().unwrap();
        assert!(
            paused
                .apply_payment(Decimal::new(2000, 0), Decimal::new(6000, 0))
                .is_err()
        );
        assert!(paused.pause().is_err());

        let resumed = paused.resume(date(2026, 5, 10)).unwrap();
        assert_eq!(resumed.status, GullakStatus::Active);
        assert_eq!(resumed.next_payment_date, Some(date(2026, 5, 31)));
    }

    #[test]
    fn test_projection() {
        // 2 g at ₹6,000/g = ₹12,000 -> 6 monthly installments of ₹2,000
        let projection = project(
            Decimal::new(2, 0),
            Decimal::new(6000, 0),
            Decimal::new(2000, 0),
            PaymentFrequency::Monthly,
            date(2026, 1, 31),
        )
        .unwrap();
        assert_eq!(projection.installments_needed, 6);
        assert_eq!(projection.estimated_cost, Decimal::new(12_000, 0));
        assert_eq!(projection.completion_date, date(2026, 6, 30));
    }

    #[test]
    fn test_projection_rounds_installments_up() {
        let projection = project(
            Decimal::new(1, 0),
            Decimal::new(6500, 0),
            Decimal::new(1000, 0),
            PaymentFrequency::Weekly,
            date(2026, 3, 2),
        )
        .unwrap();
        assert_eq!(projection.installments_needed, 7);
        assert_eq!(projection.completion_date, date(2026, 4, 13));
    }

    #[test]
    fn test_payment_overflow_is_an_error() {
        let (after, _) = plan()
            .apply_payment(Decimal::new(2000, 0), Decimal::new(6000, 0))
            .unwrap();
        assert_eq!(
            after.apply_payment(Decimal::MAX, Decimal::new(6000, 0)),
            Err(GullakError::Overflow)
        );
        assert_eq!(
            plan().apply_payment(Decimal::MAX, Decimal::new(1, 28)),
            Err(GullakError::Overflow)
        );
    }

    #[test]
    fn test_projection_overflow_is_an_error() {
        let huge = Decimal::from_str_exact("79000000000000000000000000").unwrap();
        assert_eq!(
            project(
                huge,
                Decimal::new(6000, 0),
                Decimal::new(2000, 0),
                PaymentFrequency::Monthly,
                date(2026, 1, 1),
            ),
            Err(GullakError::Overflow)
        );
    }

    #[test]
    fn test_progress_with_tiny_target() {
        let mut tiny = plan();
        tiny.target_grams = Decimal::new(1, 28);
        tiny.accumulated_grams = Decimal::MAX;
        assert_eq!(tiny.progress_percent(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_projection_rejects_endless_plans() {
        assert_eq!(
            project(
                Decimal::new(1000, 0),
                Decimal::new(6000, 0),
                Decimal::new(100, 0),
                PaymentFrequency::Daily,
                date(2026, 1, 1),
            ),
            Err(GullakError::TooManyInstallments)
        );
    }
}
