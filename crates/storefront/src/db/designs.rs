//! Wholesaler design submission repository.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use kanak_core::{DesignId, MetalType, Purity, ReviewStatus, UserId};

use super::RepositoryError;
use crate::models::workflows::WholesalerDesign;

const DESIGN_COLUMNS: &str = r"
    id, wholesaler_id, title, description, metal, purity, weight_grams, wholesale_price,
    image_url, status, admin_note, reviewed_at, created_at
";

#[derive(Debug, Clone, Deserialize)]
pub struct DesignInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    pub wholesale_price: Decimal,
    pub image_url: Option<String>,
}

/// Repository for wholesaler design database operations.
pub struct DesignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DesignRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Submit a design for review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        wholesaler_id: UserId,
        input: &DesignInput,
    ) -> Result<WholesalerDesign, RepositoryError> {
        let design = sqlx::query_as::<_, WholesalerDesign>(&format!(
            r"
            INSERT INTO store.wholesaler_designs
                (wholesaler_id, title, description, metal, purity, weight_grams,
                 wholesale_price, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DESIGN_COLUMNS}
            "
        ))
        .bind(wholesaler_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.metal)
        .bind(input.purity)
        .bind(input.weight_grams)
        .bind(input.wholesale_price)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(design)
    }

    /// Designs, newest first. `wholesaler` narrows to one submitter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        wholesaler: Option<UserId>,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<WholesalerDesign>, RepositoryError> {
        let designs = sqlx::query_as::<_, WholesalerDesign>(&format!(
            r"
            SELECT {DESIGN_COLUMNS} FROM store.wholesaler_designs
            WHERE ($1::INTEGER IS NULL OR wholesaler_id = $1)
              AND ($2::store.review_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(wholesaler)
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(designs)
    }

    /// Approve or reject a pending design.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the design doesn't exist.
    /// Returns `RepositoryError::Conflict` if it was already reviewed.
    pub async fn review(
        &self,
        id: DesignId,
        decision: ReviewStatus,
        note: Option<&str>,
        reviewer: UserId,
    ) -> Result<WholesalerDesign, RepositoryError> {
        ReviewStatus::Pending
            .transition(decision)
            .map_err(|e| RepositoryError::Rejected(e.to_string()))?;

        let reviewed = sqlx::query_as::<_, WholesalerDesign>(&format!(
            r"
            UPDATE store.wholesaler_designs
            SET status = $2, admin_note = $3, reviewed_by = $4, reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {DESIGN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(decision)
        .bind(note)
        .bind(reviewer)
        .fetch_optional(self.pool)
        .await?;

        if let Some(design) = reviewed {
            return Ok(design);
        }

        let current: Option<(ReviewStatus,)> =
            sqlx::query_as("SELECT status FROM store.wholesaler_designs WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        match current {
            None => Err(RepositoryError::NotFound),
            Some((current,)) => Err(RepositoryError::already_reviewed(current, decision)),
        }
    }
}
