//! Public catalog: categories and products.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kanak_core::{MetalType, Purity};

use crate::db::catalog::ProductFilter;
use crate::db::{CatalogRepository, Page};
use crate::error::{AppError, Result};
use crate::models::catalog::{Category, Product};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories))
        .route("/products", get(products))
        .route("/products/{slug}", get(product))
}

/// Listing query. Kept flat so every field parses from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub metal: Option<MetalType>,
    pub purity: Option<Purity>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub q: Option<String>,
    pub featured: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ProductQuery {
    fn split(self) -> (ProductFilter, Page) {
        let page = Page::new(self.page, self.per_page);
        let filter = ProductFilter {
            category: self.category,
            metal: self.metal,
            purity: self.purity,
            min_price: self.min_price,
            max_price: self.max_price,
            q: self.q,
            featured: self.featured,
        };
        (filter, page)
    }
}

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// GET /api/categories
async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// GET /api/products
async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Paginated<Product>>> {
    let (filter, page) = query.split();
    let (items, total) = CatalogRepository::new(state.pool())
        .list_products(&filter, page)
        .await?;

    Ok(Json(Paginated {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// GET /api/products/{slug}
async fn product(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>> {
    CatalogRepository::new(state.pool())
        .get_active_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_split_clamps_paging() {
        let query = ProductQuery {
            metal: Some(MetalType::Gold),
            per_page: Some(1_000),
            ..ProductQuery::default()
        };
        let (filter, page) = query.split();
        assert_eq!(filter.metal, Some(MetalType::Gold));
        assert_eq!(page.per_page, Page::MAX_PER_PAGE);
        assert_eq!(page.page, 1);
    }
}
