//! Wishlist handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;

use kanak_core::ProductId;
use kanak_core::checkout::CartQuantity;

use crate::db::{CartRepository, RepositoryError, WishlistRepository};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::commerce::{CartView, WishlistEntry};
use crate::routes::cart::cart_view;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(add))
        .route("/{product_id}", delete(remove))
        .route("/{product_id}/move-to-cart", post(move_to_cart))
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
}

/// GET /api/wishlist
async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<WishlistEntry>>> {
    Ok(Json(WishlistRepository::new(state.pool()).list(user.id).await?))
}

/// Adding twice is harmless: 201 the first time, 200 after.
///
/// POST /api/wishlist
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddRequest>,
) -> Result<(StatusCode, Json<Vec<WishlistEntry>>)> {
    let repo = WishlistRepository::new(state.pool());
    let created = repo.add(user.id, req.product_id).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(repo.list(user.id).await?)))
}

/// DELETE /api/wishlist/{product_id}
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add one to the cart, then drop it from the wishlist if it was there.
///
/// POST /api/wishlist/{product_id}/move-to-cart
async fn move_to_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool())
        .add(user.id, product_id, CartQuantity::default())
        .await?;
    match WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await
    {
        Ok(()) | Err(RepositoryError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(Json(cart_view(&state, user.id).await?))
}
