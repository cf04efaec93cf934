//! Wishlist repository.

use sqlx::PgPool;

use kanak_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::commerce::WishlistEntry;

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's saved products that are still on sale, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, WishlistEntry>(
            r"
            SELECT w.id, w.product_id, p.name, p.slug, p.image_url, p.price,
                   p.stock_quantity, w.created_at AS added_at
            FROM store.wishlist_items w
            JOIN store.products p ON p.id = w.product_id
            WHERE w.user_id = $1 AND p.is_active
            ORDER BY w.created_at DESC, w.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Save a product. Saving it twice is a no-op.
    ///
    /// Returns `true` if the product was newly added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist or is inactive.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO store.wishlist_items (user_id, product_id)
            SELECT $1, p.id FROM store.products p WHERE p.id = $2 AND p.is_active
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Nothing inserted: either already saved or the product is gone
        let (saved,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM store.wishlist_items WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        if saved { Ok(false) } else { Err(RepositoryError::NotFound) }
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product wasn't saved.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM store.wishlist_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
