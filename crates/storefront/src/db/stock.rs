//! Stock ledger repository.
//!
//! `products.stock_quantity` is only ever changed through [`move_stock`], so
//! every change has a matching row in `stock_movements`.

use sqlx::{PgPool, Postgres, Transaction};

use kanak_core::{ProductId, StockMovementKind, UserId};

use super::RepositoryError;
use crate::models::ledger::{StockLevel, StockMovement};

const MOVEMENT_COLUMNS: &str = "id, product_id, kind, quantity_delta, note, created_by, created_at";

/// Repository for stock database operations.
pub struct StockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stock per product, lowest first. `low_threshold` marks products at or
    /// below it; `low_only` drops everything else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn levels(
        &self,
        low_threshold: i32,
        low_only: bool,
    ) -> Result<Vec<StockLevel>, RepositoryError> {
        let levels = sqlx::query_as::<_, StockLevel>(
            r"
            SELECT id AS product_id, name, slug, metal, purity, stock_quantity, is_active,
                   stock_quantity <= $1 AS low_stock
            FROM store.products
            WHERE NOT $2 OR (stock_quantity <= $1 AND is_active)
            ORDER BY stock_quantity, name
            ",
        )
        .bind(low_threshold)
        .bind(low_only)
        .fetch_all(self.pool)
        .await?;

        Ok(levels)
    }

    /// Record a manual movement (`inward`, `adjustment` or `return`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` if the kind isn't manual, the sign
    /// doesn't fit the kind, or stock would go negative.
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn record(
        &self,
        product_id: ProductId,
        kind: StockMovementKind,
        delta: i32,
        note: Option<&str>,
        created_by: UserId,
    ) -> Result<StockMovement, RepositoryError> {
        check_manual_movement(kind, delta)?;

        let mut tx = self.pool.begin().await?;

        let stock: Option<(i32,)> =
            sqlx::query_as("SELECT stock_quantity FROM store.products WHERE id = $1 FOR UPDATE")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (stock,) = stock.ok_or(RepositoryError::NotFound)?;

        if stock.checked_add(delta).is_none_or(|after| after < 0) {
            return Err(RepositoryError::Rejected(format!(
                "only {stock} in stock, cannot remove {}",
                delta.unsigned_abs()
            )));
        }

        let movement = move_stock(&mut tx, product_id, kind, delta, note, Some(created_by)).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            kind = %kind,
            delta,
            "Stock movement recorded"
        );

        Ok(movement)
    }

    /// Recent movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn movements(
        &self,
        product_id: Option<ProductId>,
        limit: i64,
    ) -> Result<Vec<StockMovement>, RepositoryError> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            r"
            SELECT {MOVEMENT_COLUMNS} FROM store.stock_movements
            WHERE ($1::INTEGER IS NULL OR product_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(movements)
    }
}

fn check_manual_movement(kind: StockMovementKind, delta: i32) -> Result<(), RepositoryError> {
    if !kind.is_manual() {
        return Err(RepositoryError::Rejected(format!(
            "{kind} movements are recorded by sales"
        )));
    }
    if !kind.accepts_delta(delta) {
        return Err(RepositoryError::Rejected(format!(
            "quantity {delta} is not valid for {kind}"
        )));
    }
    Ok(())
}

/// Apply a stock delta and write its movement. The `stock_quantity >= 0`
/// check constraint backs up the caller's own stock check.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product doesn't exist.
pub(crate) async fn move_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    kind: StockMovementKind,
    delta: i32,
    note: Option<&str>,
    created_by: Option<UserId>,
) -> Result<StockMovement, RepositoryError> {
    let updated = sqlx::query("UPDATE store.products SET stock_quantity = stock_quantity + $2 WHERE id = $1")
        .bind(product_id)
        .bind(delta)
        .execute(&mut **tx)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    let movement = sqlx::query_as::<_, StockMovement>(&format!(
        r"
        INSERT INTO store.stock_movements (product_id, kind, quantity_delta, note, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {MOVEMENT_COLUMNS}
        "
    ))
    .bind(product_id)
    .bind(kind)
    .bind(delta)
    .bind(note)
    .bind(created_by)
    .fetch_one(&mut **tx)
    .await?;

    Ok(movement)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_movement_rules() {
        assert!(check_manual_movement(StockMovementKind::Inward, 5).is_ok());
        assert!(check_manual_movement(StockMovementKind::Adjustment, -2).is_ok());
        assert!(check_manual_movement(StockMovementKind::Return, 1).is_ok());

        let err = check_manual_movement(StockMovementKind::Inward, -5).unwrap_err();
        assert_eq!(err.to_string(), "quantity -5 is not valid for inward");

        let err = check_manual_movement(StockMovementKind::OfflineSale, -1).unwrap_err();
        assert_eq!(err.to_string(), "offline_sale movements are recorded by sales");
    }
}
