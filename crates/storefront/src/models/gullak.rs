//! Gullak savings plan rows and their mapping to the core plan rules.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kanak_core::gullak::GullakPlan;
use kanak_core::{
    GullakAccountId, GullakPaymentId, GullakStatus, MetalType, PaymentFrequency, Purity, UserId,
};

use crate::db::RepositoryError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GullakAccount {
    pub id: GullakAccountId,
    pub user_id: UserId,
    pub metal: MetalType,
    pub purity: Purity,
    pub target_grams: Decimal,
    pub installment_amount: Decimal,
    pub frequency: PaymentFrequency,
    pub anchor_day: i32,
    pub start_date: NaiveDate,
    pub next_payment_date: Option<NaiveDate>,
    pub installments_paid: i32,
    pub total_paid: Decimal,
    pub accumulated_grams: Decimal,
    pub status: GullakStatus,
    pub created_at: DateTime<Utc>,
}

impl GullakAccount {
    /// The plan state the core rules operate on.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored anchor day is negative.
    pub fn plan(&self) -> Result<GullakPlan, RepositoryError> {
        let anchor_day = u32::try_from(self.anchor_day).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "gullak account {} has anchor day {}",
                self.id, self.anchor_day
            ))
        })?;

        Ok(GullakPlan {
            target_grams: self.target_grams,
            installment_amount: self.installment_amount,
            frequency: self.frequency,
            anchor_day,
            next_payment_date: self.next_payment_date,
            installments_paid: self.installments_paid,
            total_paid: self.total_paid,
            accumulated_grams: self.accumulated_grams,
            status: self.status,
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GullakPayment {
    pub id: GullakPaymentId,
    pub amount: Decimal,
    pub rate_per_gram: Decimal,
    pub grams: Decimal,
    pub paid_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// An account with its payment history and progress.
#[derive(Debug, Clone, Serialize)]
pub struct GullakAccountDetail {
    #[serde(flatten)]
    pub account: GullakAccount,
    pub progress_percent: Decimal,
    pub payments: Vec<GullakPayment>,
}
