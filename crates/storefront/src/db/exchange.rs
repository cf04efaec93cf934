//! Exchange request repository.
//!
//! A request is reviewed once: the review `UPDATE` only matches rows that are
//! still `pending`, so concurrent reviewers cannot both win.

use rust_decimal::Decimal;
use sqlx::PgPool;

use kanak_core::{ExchangeRequestId, MetalType, Purity, ReviewStatus, UserId};

use super::RepositoryError;
use crate::models::workflows::ExchangeRequest;

pub(crate) const EXCHANGE_COLUMNS: &str = r"
    id, user_id, metal, purity, weight_grams, description, image_url, estimated_value,
    appraised_value, status, admin_note, redeemed_order_id, reviewed_at, created_at
";

/// Fields a customer submits.
pub struct NewExchangeRequest<'a> {
    pub user_id: UserId,
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    pub description: &'a str,
    pub image_url: Option<&'a str>,
    pub estimated_value: Decimal,
}

/// An admin's verdict on a pending request.
#[derive(Debug, Clone, Copy)]
pub enum ExchangeDecision<'a> {
    Approve {
        appraised_value: Decimal,
        note: Option<&'a str>,
    },
    Reject {
        note: Option<&'a str>,
    },
}

/// Repository for exchange request database operations.
pub struct ExchangeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExchangeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a new pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        new: &NewExchangeRequest<'_>,
    ) -> Result<ExchangeRequest, RepositoryError> {
        let request = sqlx::query_as::<_, ExchangeRequest>(&format!(
            r"
            INSERT INTO store.exchange_requests
                (user_id, metal, purity, weight_grams, description, image_url, estimated_value)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {EXCHANGE_COLUMNS}
            "
        ))
        .bind(new.user_id)
        .bind(new.metal)
        .bind(new.purity)
        .bind(new.weight_grams)
        .bind(new.description)
        .bind(new.image_url)
        .bind(new.estimated_value)
        .fetch_one(self.pool)
        .await?;

        Ok(request)
    }

    /// A customer's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ExchangeRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, ExchangeRequest>(&format!(
            r"
            SELECT {EXCHANGE_COLUMNS} FROM store.exchange_requests
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// All requests, optionally filtered by status. Oldest first so the
    /// review queue reads top-down.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<ExchangeRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, ExchangeRequest>(&format!(
            r"
            SELECT {EXCHANGE_COLUMNS} FROM store.exchange_requests
            WHERE ($1::store.review_status IS NULL OR status = $1)
            ORDER BY created_at, id
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// Move a pending request to approved or rejected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request doesn't exist.
    /// Returns `RepositoryError::Conflict` if it was already reviewed.
    pub async fn review(
        &self,
        id: ExchangeRequestId,
        decision: ExchangeDecision<'_>,
        reviewer: UserId,
    ) -> Result<ExchangeRequest, RepositoryError> {
        let (status, appraised_value, note) = match decision {
            ExchangeDecision::Approve {
                appraised_value,
                note,
            } => (ReviewStatus::Approved, Some(appraised_value), note),
            ExchangeDecision::Reject { note } => (ReviewStatus::Rejected, None, note),
        };

        let reviewed = sqlx::query_as::<_, ExchangeRequest>(&format!(
            r"
            UPDATE store.exchange_requests
            SET status = $2, appraised_value = $3, admin_note = $4,
                reviewed_by = $5, reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {EXCHANGE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(appraised_value)
        .bind(note)
        .bind(reviewer)
        .fetch_optional(self.pool)
        .await?;

        if let Some(request) = reviewed {
            return Ok(request);
        }

        let current: Option<(ReviewStatus,)> =
            sqlx::query_as("SELECT status FROM store.exchange_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match current {
            None => Err(RepositoryError::NotFound),
            Some((current,)) => Err(RepositoryError::already_reviewed(current, status)),
        }
    }
}
