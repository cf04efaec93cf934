//! Counter (in-store) sale repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use kanak_core::checkout::{CartQuantity, PricedLine};
use kanak_core::{OfflineSaleId, PaymentMethod, ProductId, StockMovementKind, UserId};

use super::RepositoryError;
use super::stock::move_stock;
use crate::models::ledger::OfflineSale;

const SALE_SELECT: &str = r"
    SELECT s.id, s.product_id, p.name AS product_name, s.quantity, s.unit_price, s.total,
           s.payment_method, s.customer_name, s.customer_phone, s.recorded_by, s.sold_at
    FROM store.offline_sales s
    JOIN store.products p ON p.id = s.product_id
";

/// A sale rung up at the counter.
pub struct NewOfflineSale<'a> {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Defaults to the product's list price.
    pub unit_price: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<&'a str>,
    pub customer_phone: Option<&'a str>,
    pub sold_at: Option<DateTime<Utc>>,
}

/// Repository for offline sale database operations.
pub struct OfflineSaleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfflineSaleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a sale and take the pieces out of stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Rejected` for a non-positive quantity or
    /// insufficient stock.
    pub async fn record(
        &self,
        sale: &NewOfflineSale<'_>,
        recorded_by: UserId,
    ) -> Result<OfflineSale, RepositoryError> {
        if sale.quantity < CartQuantity::MIN {
            return Err(RepositoryError::Rejected(
                "quantity must be at least 1".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let product: Option<(i32, Decimal)> = sqlx::query_as(
            "SELECT stock_quantity, price FROM store.products WHERE id = $1 FOR UPDATE",
        )
        .bind(sale.product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (stock, list_price) = product.ok_or(RepositoryError::NotFound)?;

        if sale.quantity > stock {
            return Err(RepositoryError::Rejected(format!("only {stock} in stock")));
        }

        let line = PricedLine {
            unit_price: sale.unit_price.unwrap_or(list_price),
            quantity: CartQuantity::clamped(sale.quantity),
        };

        let (id,): (OfflineSaleId,) = sqlx::query_as(
            r"
            INSERT INTO store.offline_sales (
                product_id, quantity, unit_price, total, payment_method,
                customer_name, customer_phone, recorded_by, sold_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()))
            RETURNING id
            ",
        )
        .bind(sale.product_id)
        .bind(line.quantity.get())
        .bind(line.unit_price)
        .bind(line.line_total())
        .bind(sale.payment_method)
        .bind(sale.customer_name)
        .bind(sale.customer_phone)
        .bind(recorded_by)
        .bind(sale.sold_at)
        .fetch_one(&mut *tx)
        .await?;

        let note = format!("counter sale #{id}");
        move_stock(
            &mut tx,
            sale.product_id,
            StockMovementKind::OfflineSale,
            -line.quantity.get(),
            Some(note.as_str()),
            Some(recorded_by),
        )
        .await?;

        let recorded = sqlx::query_as::<_, OfflineSale>(&format!("{SALE_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %id,
            product_id = %sale.product_id,
            total = %recorded.total,
            "Offline sale recorded"
        );

        Ok(recorded)
    }

    /// Sales in `[from, to)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OfflineSale>, RepositoryError> {
        let sales = sqlx::query_as::<_, OfflineSale>(&format!(
            "{SALE_SELECT} WHERE s.sold_at >= $1 AND s.sold_at < $2 ORDER BY s.sold_at, s.id"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(sales)
    }
}
