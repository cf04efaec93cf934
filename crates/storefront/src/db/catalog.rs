//! Category and product repository.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use kanak_core::{CategoryId, MetalType, ProductId, Purity, StockMovementKind, UserId};

use super::{Page, RepositoryError};
use crate::models::catalog::{Category, Product};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.category_id, c.slug AS category_slug, p.name, p.slug, p.description,
           p.metal, p.purity, p.weight_grams, p.making_charge, p.price, p.stock_quantity,
           p.image_url, p.gallery, p.is_featured, p.is_active, p.created_at, p.updated_at
    FROM store.products p
    JOIN store.categories c ON c.id = p.category_id
";

/// Category fields supplied by an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Product fields supplied by an admin.
///
/// Stock is only set on creation; later changes go through stock movements.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    #[serde(default)]
    pub making_charge: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Storefront listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub metal: Option<MetalType>,
    pub purity: Option<Purity>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Free-text search on name and description.
    pub q: Option<String>,
    pub featured: Option<bool>,
}

impl ProductFilter {
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE p.is_active");

        if let Some(ref category) = self.category {
            query.push(" AND c.slug = ");
            query.push_bind(category.clone());
        }
        if let Some(metal) = self.metal {
            query.push(" AND p.metal = ");
            query.push_bind(metal);
        }
        if let Some(purity) = self.purity {
            query.push(" AND p.purity = ");
            query.push_bind(purity);
        }
        if let Some(min) = self.min_price {
            query.push(" AND p.price >= ");
            query.push_bind(min);
        }
        if let Some(max) = self.max_price {
            query.push(" AND p.price <= ");
            query.push_bind(max);
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(q));
            query.push(" AND (p.name ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR p.description ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(featured) = self.featured {
            query.push(" AND p.is_featured = ");
            query.push_bind(featured);
        }
    }
}

/// Escape `%`, `_` and `\` so user input matches literally in `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List categories with their active product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r"
            SELECT c.id, c.name, c.slug, c.description, c.image_url,
                   COUNT(p.id) FILTER (WHERE p.is_active) AS product_count
            FROM store.categories c
            LEFT JOIN store.products p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO store.categories (name, slug, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, image_url, 0::BIGINT AS product_count
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "category slug already exists"))
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            UPDATE store.categories
            SET name = $2, slug = $3, description = $4, image_url = $5
            WHERE id = $1
            RETURNING id, name, slug, description, image_url,
                      (SELECT COUNT(*) FROM store.products p
                       WHERE p.category_id = $1 AND p.is_active) AS product_count
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "category slug already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category. Categories that still hold products cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if products still reference it.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    RepositoryError::Conflict("category still has products".to_owned())
                }
                other => RepositoryError::Database(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List active products matching `filter`, returning the page and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        filter.push_conditions(&mut query);
        query.push(" ORDER BY p.is_featured DESC, p.created_at DESC, p.id DESC LIMIT ");
        query.push_bind(page.per_page);
        query.push(" OFFSET ");
        query.push_bind(page.offset());
        let products = query.build_query_as::<Product>().fetch_all(self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM store.products p JOIN store.categories c ON c.id = p.category_id",
        );
        filter.push_conditions(&mut count);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        Ok((products, total))
    }

    /// Get an active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.slug = $1 AND p.is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// Create a product. Opening stock is recorded as an inward movement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn create_product(
        &self,
        input: &ProductInput,
        created_by: UserId,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (ProductId,) = sqlx::query_as(
            r"
            INSERT INTO store.products (
                category_id, name, slug, description, metal, purity, weight_grams,
                making_charge, price, stock_quantity, image_url, gallery, is_featured, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.metal)
        .bind(input.purity)
        .bind(input.weight_grams)
        .bind(input.making_charge)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(&input.image_url)
        .bind(&input.gallery)
        .bind(input.is_featured)
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product slug already exists"))?;

        if input.stock_quantity > 0 {
            sqlx::query(
                r"
                INSERT INTO store.stock_movements (product_id, kind, quantity_delta, note, created_by)
                VALUES ($1, $2, $3, 'opening stock', $4)
                ",
            )
            .bind(id)
            .bind(StockMovementKind::Inward)
            .bind(input.stock_quantity)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;
        }

        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Update a product's catalog fields. Stock is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE store.products
            SET category_id = $2, name = $3, slug = $4, description = $5, metal = $6,
                purity = $7, weight_grams = $8, making_charge = $9, price = $10,
                image_url = $11, gallery = $12, is_featured = $13, is_active = $14
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.metal)
        .bind(input.purity)
        .bind(input.weight_grams)
        .bind(input.making_charge)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(&input.gallery)
        .bind(input.is_featured)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product slug already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Hide a product from the storefront. Order history keeps referencing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn deactivate_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE store.products SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Upsert a category by slug (seeding).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(&self, input: &CategoryInput) -> Result<CategoryId, RepositoryError> {
        let (id,): (CategoryId,) = sqlx::query_as(
            r"
            INSERT INTO store.categories (name, slug, description, image_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, description = EXCLUDED.description,
                image_url = EXCLUDED.image_url
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Upsert a product by slug (seeding). Stock is only set for new products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn upsert_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let (id,): (ProductId,) = sqlx::query_as(
            r"
            INSERT INTO store.products (
                category_id, name, slug, description, metal, purity, weight_grams,
                making_charge, price, stock_quantity, image_url, gallery, is_featured, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (slug) DO UPDATE
            SET category_id = EXCLUDED.category_id, name = EXCLUDED.name,
                description = EXCLUDED.description, metal = EXCLUDED.metal,
                purity = EXCLUDED.purity, weight_grams = EXCLUDED.weight_grams,
                making_charge = EXCLUDED.making_charge, price = EXCLUDED.price,
                image_url = EXCLUDED.image_url, gallery = EXCLUDED.gallery,
                is_featured = EXCLUDED.is_featured, is_active = EXCLUDED.is_active
            RETURNING id
            ",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.metal)
        .bind(input.purity)
        .bind(input.weight_grams)
        .bind(input.making_charge)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(&input.image_url)
        .bind(&input.gallery)
        .bind(input.is_featured)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "product slug already exists"))?;

        Ok(id)
    }
}
