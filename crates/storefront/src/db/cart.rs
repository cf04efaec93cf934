//! Cart repository.

use sqlx::PgPool;

use kanak_core::checkout::CartQuantity;
use kanak_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::commerce::CartLine;

const LINE_SELECT: &str = r"
    SELECT ci.id, ci.product_id, p.name, p.slug, p.image_url, p.price AS unit_price,
           ci.quantity, p.stock_quantity, p.is_active
    FROM store.cart_items ci
    JOIN store.products p ON p.id = ci.product_id
";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist or is inactive.
    /// Returns `RepositoryError::Rejected` if the resulting quantity exceeds stock.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: CartQuantity,
    ) -> Result<CartLine, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock: Option<(i32,)> = sqlx::query_as(
            "SELECT stock_quantity FROM store.products WHERE id = $1 AND is_active FOR SHARE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (stock,) = stock.ok_or(RepositoryError::NotFound)?;

        let existing: Option<(i32,)> = sqlx::query_as(
            "SELECT quantity FROM store.cart_items WHERE user_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let wanted = existing.map_or(quantity, |(current,)| {
            CartQuantity::clamped(current).saturating_add(quantity)
        });
        ensure_in_stock(wanted, stock)?;

        let (id,): (CartItemId,) = sqlx::query_as(
            r"
            INSERT INTO store.cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(wanted.get())
        .fetch_one(&mut *tx)
        .await?;

        let line = sqlx::query_as::<_, CartLine>(&format!("{LINE_SELECT} WHERE ci.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(line)
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in the user's cart.
    /// Returns `RepositoryError::Rejected` if the quantity exceeds stock.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: CartQuantity,
    ) -> Result<CartLine, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT p.stock_quantity
            FROM store.cart_items ci
            JOIN store.products p ON p.id = ci.product_id
            WHERE ci.id = $1 AND ci.user_id = $2
            FOR UPDATE OF ci
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (stock,) = stock.ok_or(RepositoryError::NotFound)?;
        ensure_in_stock(quantity, stock)?;

        sqlx::query("UPDATE store.cart_items SET quantity = $2 WHERE id = $1")
            .bind(item_id)
            .bind(quantity.get())
            .execute(&mut *tx)
            .await?;

        let line = sqlx::query_as::<_, CartLine>(&format!("{LINE_SELECT} WHERE ci.id = $1"))
            .bind(item_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(line)
    }

    /// Remove one line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in the user's cart.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM store.cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn ensure_in_stock(wanted: CartQuantity, stock: i32) -> Result<(), RepositoryError> {
    if wanted.get() > stock {
        return Err(RepositoryError::Rejected(format!("only {stock} in stock")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_in_stock() {
        assert!(ensure_in_stock(CartQuantity::clamped(2), 2).is_ok());
        let err = ensure_in_stock(CartQuantity::clamped(3), 2).unwrap_err();
        assert_eq!(err.to_string(), "only 2 in stock");
        assert!(ensure_in_stock(CartQuantity::clamped(1), 0).is_err());
    }
}
