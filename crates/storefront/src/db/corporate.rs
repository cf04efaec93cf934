//! Corporate partnership registration repository.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use kanak_core::{CorporateRegistrationId, ReviewStatus, UserId};

use super::RepositoryError;
use crate::models::workflows::CorporateRegistration;

const REGISTRATION_COLUMNS: &str = r"
    id, company_name, contact_name, email, phone, employee_count, gst_number, message,
    status, discount_percent, admin_note, reviewed_at, created_at
";

/// A company's application, as submitted from the public form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationInput {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub employee_count: Option<i32>,
    pub gst_number: Option<String>,
    pub message: Option<String>,
}

/// Repository for corporate registration database operations.
pub struct CorporateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CorporateRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new pending registration.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        input: &RegistrationInput,
    ) -> Result<CorporateRegistration, RepositoryError> {
        let registration = sqlx::query_as::<_, CorporateRegistration>(&format!(
            r"
            INSERT INTO store.corporate_registrations
                (company_name, contact_name, email, phone, employee_count, gst_number, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REGISTRATION_COLUMNS}
            "
        ))
        .bind(input.company_name.trim())
        .bind(input.contact_name.trim())
        .bind(input.email.trim().to_lowercase())
        .bind(input.phone.trim())
        .bind(input.employee_count)
        .bind(input.gst_number.as_deref().map(str::trim))
        .bind(input.message.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(registration)
    }

    /// Registrations, oldest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<CorporateRegistration>, RepositoryError> {
        let registrations = sqlx::query_as::<_, CorporateRegistration>(&format!(
            r"
            SELECT {REGISTRATION_COLUMNS} FROM store.corporate_registrations
            WHERE ($1::store.review_status IS NULL OR status = $1)
            ORDER BY created_at, id
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(registrations)
    }

    /// Approve or reject a pending registration. `discount_percent` is only
    /// stored on approval.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the registration doesn't exist.
    /// Returns `RepositoryError::Conflict` if it was already reviewed.
    pub async fn review(
        &self,
        id: CorporateRegistrationId,
        decision: ReviewStatus,
        discount_percent: Option<Decimal>,
        note: Option<&str>,
        reviewer: UserId,
    ) -> Result<CorporateRegistration, RepositoryError> {
        ReviewStatus::Pending
            .transition(decision)
            .map_err(|e| RepositoryError::Rejected(e.to_string()))?;
        let discount_percent = discount_percent.filter(|_| decision == ReviewStatus::Approved);

        let reviewed = sqlx::query_as::<_, CorporateRegistration>(&format!(
            r"
            UPDATE store.corporate_registrations
            SET status = $2, discount_percent = $3, admin_note = $4,
                reviewed_by = $5, reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {REGISTRATION_COLUMNS}
            "
        ))
        .bind(id)
        .bind(decision)
        .bind(discount_percent)
        .bind(note)
        .bind(reviewer)
        .fetch_optional(self.pool)
        .await?;

        if let Some(registration) = reviewed {
            return Ok(registration);
        }

        let current: Option<(ReviewStatus,)> =
            sqlx::query_as("SELECT status FROM store.corporate_registrations WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match current {
            None => Err(RepositoryError::NotFound),
            Some((current,)) => Err(RepositoryError::already_reviewed(current, decision)),
        }
    }
}
