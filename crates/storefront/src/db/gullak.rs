//! Gullak savings account repository.
//!
//! Plan arithmetic lives in `kanak_core::gullak`; this module locks the
//! account row, applies the rule, and writes the result back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use kanak_core::gullak::{GullakError, GullakPlan};
use kanak_core::{GullakAccountId, GullakStatus, MetalType, Purity, UserId};

use super::RepositoryError;
use crate::models::gullak::{GullakAccount, GullakAccountDetail, GullakPayment};

const ACCOUNT_COLUMNS: &str = r"
    id, user_id, metal, purity, target_grams, installment_amount, frequency, anchor_day,
    start_date, next_payment_date, installments_paid, total_paid, accumulated_grams,
    status, created_at
";

const PAYMENT_COLUMNS: &str = "id, amount, rate_per_gram, grams, paid_on, created_at";

/// Pause or resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChange {
    Pause,
    Resume { today: NaiveDate },
}

impl From<GullakError> for RepositoryError {
    fn from(err: GullakError) -> Self {
        match err {
            GullakError::WrongStatus(..) => Self::Conflict(err.to_string()),
            _ => Self::Rejected(err.to_string()),
        }
    }
}

/// Repository for Gullak database operations.
pub struct GullakRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GullakRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Open an account from a freshly validated plan.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        purity: Purity,
        plan: &GullakPlan,
        start_date: NaiveDate,
    ) -> Result<GullakAccount, RepositoryError> {
        let anchor_day = i32::try_from(plan.anchor_day)
            .map_err(|_| RepositoryError::Rejected("invalid start date".to_string()))?;

        let account = sqlx::query_as::<_, GullakAccount>(&format!(
            r"
            INSERT INTO store.gullak_accounts (
                user_id, metal, purity, target_grams, installment_amount, frequency,
                anchor_day, start_date, next_payment_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(purity.metal())
        .bind(purity)
        .bind(plan.target_grams)
        .bind(plan.installment_amount)
        .bind(plan.frequency)
        .bind(anchor_day)
        .bind(start_date)
        .bind(plan.next_payment_date)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(account_id = %account.id, user_id = %user_id, "Gullak account opened");

        Ok(account)
    }

    /// A user's accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<GullakAccount>, RepositoryError> {
        let accounts = sqlx::query_as::<_, GullakAccount>(&format!(
            r"
            SELECT {ACCOUNT_COLUMNS} FROM store.gullak_accounts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(accounts)
    }

    /// All accounts, optionally filtered by status and metal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<GullakStatus>,
        metal: Option<MetalType>,
    ) -> Result<Vec<GullakAccount>, RepositoryError> {
        let accounts = sqlx::query_as::<_, GullakAccount>(&format!(
            r"
            SELECT {ACCOUNT_COLUMNS} FROM store.gullak_accounts
            WHERE ($1::store.gullak_status IS NULL OR status = $1)
              AND ($2::store.metal_type IS NULL OR metal = $2)
            ORDER BY next_payment_date NULLS LAST, id
            "
        ))
        .bind(status)
        .bind(metal)
        .fetch_all(self.pool)
        .await?;

        Ok(accounts)
    }

    /// An account with its payments. `owner` restricts the lookup to one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such account for the owner.
    pub async fn get_detail(
        &self,
        id: GullakAccountId,
        owner: Option<UserId>,
    ) -> Result<GullakAccountDetail, RepositoryError> {
        let account = sqlx::query_as::<_, GullakAccount>(&format!(
            r"
            SELECT {ACCOUNT_COLUMNS} FROM store.gullak_accounts
            WHERE id = $1 AND ($2::INTEGER IS NULL OR user_id = $2)
            "
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let payments = sqlx::query_as::<_, GullakPayment>(&format!(
            r"
            SELECT {PAYMENT_COLUMNS} FROM store.gullak_payments
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        detail(account, payments)
    }

    /// Pay an installment converted at `rate_per_gram`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such account for the owner.
    /// Returns `RepositoryError::Conflict` if the plan isn't active.
    /// Returns `RepositoryError::Rejected` for a non-positive amount.
    pub async fn record_payment(
        &self,
        id: GullakAccountId,
        owner: UserId,
        amount: Decimal,
        rate_per_gram: Decimal,
        paid_on: NaiveDate,
    ) -> Result<(GullakAccount, GullakPayment), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let account = lock_account(&mut tx, id, owner).await?;
        let (plan, grams) = account.plan()?.apply_payment(amount, rate_per_gram)?;

        let payment = sqlx::query_as::<_, GullakPayment>(&format!(
            r"
            INSERT INTO store.gullak_payments (account_id, amount, rate_per_gram, grams, paid_on)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(amount)
        .bind(rate_per_gram)
        .bind(grams)
        .bind(paid_on)
        .fetch_one(&mut *tx)
        .await?;

        let account = save_plan(&mut tx, id, &plan).await?;
        tx.commit().await?;

        tracing::info!(
            account_id = %id,
            amount = %amount,
            grams = %grams,
            status = %account.status,
            "Gullak payment recorded"
        );

        Ok((account, payment))
    }

    /// Pause or resume an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such account for the owner.
    /// Returns `RepositoryError::Conflict` if the plan is in the wrong state.
    pub async fn change(
        &self,
        id: GullakAccountId,
        owner: UserId,
        change: PlanChange,
    ) -> Result<GullakAccount, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_account(&mut tx, id, owner).await?.plan()?;
        let plan = match change {
            PlanChange::Pause => current.pause()?,
            PlanChange::Resume { today } => current.resume(today)?,
        };

        let account = save_plan(&mut tx, id, &plan).await?;
        tx.commit().await?;

        Ok(account)
    }
}

async fn lock_account(
    tx: &mut Transaction<'_, Postgres>,
    id: GullakAccountId,
    owner: UserId,
) -> Result<GullakAccount, RepositoryError> {
    sqlx::query_as::<_, GullakAccount>(&format!(
        r"
        SELECT {ACCOUNT_COLUMNS} FROM store.gullak_accounts
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        "
    ))
    .bind(id)
    .bind(owner)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(RepositoryError::NotFound)
}

async fn save_plan(
    tx: &mut Transaction<'_, Postgres>,
    id: GullakAccountId,
    plan: &GullakPlan,
) -> Result<GullakAccount, RepositoryError> {
    let account = sqlx::query_as::<_, GullakAccount>(&format!(
        r"
        UPDATE store.gullak_accounts
        SET next_payment_date = $2, installments_paid = $3, total_paid = $4,
            accumulated_grams = $5, status = $6
        WHERE id = $1
        RETURNING {ACCOUNT_COLUMNS}
        "
    ))
    .bind(id)
    .bind(plan.next_payment_date)
    .bind(plan.installments_paid)
    .bind(plan.total_paid)
    .bind(plan.accumulated_grams)
    .bind(plan.status)
    .fetch_one(&mut **tx)
    .await?;

    Ok(account)
}

fn detail(
    account: GullakAccount,
    payments: Vec<GullakPayment>,
) -> Result<GullakAccountDetail, RepositoryError> {
    let progress_percent = account.plan()?.progress_percent();
    Ok(GullakAccountDetail {
        account,
        progress_percent,
        payments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_status_is_conflict() {
        let err: RepositoryError =
            GullakError::WrongStatus(GullakStatus::Completed, GullakStatus::Active).into();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let err: RepositoryError = GullakError::NonPositiveAmount.into();
        assert!(matches!(err, RepositoryError::Rejected(_)));

        let err: RepositoryError = GullakError::Overflow.into();
        assert!(matches!(err, RepositoryError::Rejected(_)));
    }
}
