//! Catalog management: categories and products.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};
use tracing::instrument;

use kanak_core::{CategoryId, ProductId};

use crate::db::CatalogRepository;
use crate::db::catalog::{CategoryInput, ProductInput};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::catalog::{Category, Product};
use crate::routes::validation::{money, purity_matches, required, weight};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(deactivate_product))
}

fn validate_category(input: &CategoryInput) -> Result<()> {
    required("name", &input.name)?;
    validate_slug(&input.slug)
}

fn validate_product(input: &ProductInput) -> Result<()> {
    required("name", &input.name)?;
    validate_slug(&input.slug)?;
    purity_matches(input.metal, input.purity)?;
    weight("weight_grams", input.weight_grams)?;
    money("making_charge", input.making_charge)?;
    money("price", input.price)?;
    if input.stock_quantity < 0 {
        return Err(AppError::BadRequest(
            "stock_quantity must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Lowercase letters, digits and single hyphens.
fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("invalid slug: {slug}")))
    }
}

/// POST /api/admin/categories
async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    validate_category(&input)?;
    let category = CatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/admin/categories/{id}
async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    validate_category(&input)?;
    let category = CatalogRepository::new(state.pool())
        .update_category(id, &input)
        .await?;
    Ok(Json(category))
}

/// DELETE /api/admin/categories/{id}
async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool()).delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/products
#[instrument(skip(state, admin, input), fields(slug = %input.slug))]
async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_product(&input)?;
    let product = CatalogRepository::new(state.pool())
        .create_product(&input, admin.id)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Stock is not changed here; use a stock movement.
///
/// PUT /api/admin/products/{id}
#[instrument(skip(state, input), fields(slug = %input.slug))]
async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    validate_product(&input)?;
    let product = CatalogRepository::new(state.pool())
        .update_product(id, &input)
        .await?;
    Ok(Json(product))
}

/// Soft delete: the product disappears from the storefront but old orders
/// keep pointing at it.
///
/// DELETE /api/admin/products/{id}
async fn deactivate_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool())
        .deactivate_product(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use kanak_core::{MetalType, Purity};

    use super::*;

    fn product() -> ProductInput {
        ProductInput {
            category_id: 1.into(),
            name: "Temple Jhumka".to_string(),
            slug: "temple-jhumka".to_string(),
            description: String::new(),
            metal: MetalType::Gold,
            purity: Purity::K22,
            weight_grams: Decimal::new(1250, 2),
            making_charge: Decimal::new(4500, 0),
            price: Decimal::new(87_450, 0),
            stock_quantity: 3,
            image_url: None,
            gallery: Vec::new(),
            is_featured: false,
            is_active: true,
        }
    }

    #[test]
    fn test_slug_rules() {
        assert!(validate_slug("temple-jhumka-22k").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Temple").is_err());
        assert!(validate_slug("-jhumka").is_err());
        assert!(validate_slug("a--b").is_err());
    }

    #[test]
    fn test_product_validation() {
        assert!(validate_product(&product()).is_ok());
        assert!(validate_product(&ProductInput { purity: Purity::Silver925, ..product() }).is_err());
        assert!(validate_product(&ProductInput { price: Decimal::new(-1, 0), ..product() }).is_err());
        assert!(validate_product(&ProductInput { weight_grams: Decimal::ZERO, ..product() }).is_err());
        assert!(validate_product(&ProductInput { stock_quantity: -1, ..product() }).is_err());
    }
}
