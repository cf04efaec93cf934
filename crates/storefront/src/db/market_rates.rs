//! Market rate repository.
//!
//! Rates are append-only. The current board is the newest row per
//! `(metal, purity)` whose effective date is not in the future.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use kanak_core::{MetalType, Purity, UserId};

use super::RepositoryError;
use crate::models::catalog::MarketRate;

const RATE_COLUMNS: &str = "id, metal, purity, rate_per_gram, effective_date, created_at";

/// Repository for market rate database operations.
pub struct MarketRateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MarketRateRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Latest rate per `(metal, purity)` effective on or before `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn current(&self, as_of: NaiveDate) -> Result<Vec<MarketRate>, RepositoryError> {
        let rates = sqlx::query_as::<_, MarketRate>(&format!(
            r"
            SELECT DISTINCT ON (metal, purity) {RATE_COLUMNS}
            FROM store.market_rates
            WHERE effective_date <= $1
            ORDER BY metal, purity, effective_date DESC, id DESC
            "
        ))
        .bind(as_of)
        .fetch_all(self.pool)
        .await?;

        Ok(rates)
    }

    /// Record a new rate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        purity: Purity,
        rate_per_gram: Decimal,
        effective_date: NaiveDate,
        created_by: Option<UserId>,
    ) -> Result<MarketRate, RepositoryError> {
        let rate = sqlx::query_as::<_, MarketRate>(&format!(
            r"
            INSERT INTO store.market_rates (metal, purity, rate_per_gram, effective_date, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RATE_COLUMNS}
            "
        ))
        .bind(purity.metal())
        .bind(purity)
        .bind(rate_per_gram)
        .bind(effective_date)
        .bind(created_by)
        .fetch_one(self.pool)
        .await?;

        Ok(rate)
    }

    /// Rate history, newest first, optionally narrowed to a metal or purity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(
        &self,
        metal: Option<MetalType>,
        purity: Option<Purity>,
        limit: i64,
    ) -> Result<Vec<MarketRate>, RepositoryError> {
        let rates = sqlx::query_as::<_, MarketRate>(&format!(
            r"
            SELECT {RATE_COLUMNS}
            FROM store.market_rates
            WHERE ($1::store.metal_type IS NULL OR metal = $1)
              AND ($2::store.purity IS NULL OR purity = $2)
            ORDER BY effective_date DESC, id DESC
            LIMIT $3
            "
        ))
        .bind(metal)
        .bind(purity)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rates)
    }

    /// Insert a rate unless the same grade already has one for that day.
    /// Used by catalog seeding so reruns don't pile up duplicates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        purity: Purity,
        rate_per_gram: Decimal,
        effective_date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE store.market_rates SET rate_per_gram = $3
            WHERE purity = $1 AND effective_date = $2
            ",
        )
        .bind(purity)
        .bind(effective_date)
        .bind(rate_per_gram)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r"
                INSERT INTO store.market_rates (metal, purity, rate_per_gram, effective_date)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(purity.metal())
            .bind(purity)
            .bind(rate_per_gram)
            .bind(effective_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
