//! Cart route handlers.
//!
//! Carts are server-side rows keyed by user, so they follow the customer
//! across devices. Every mutation answers with the repriced cart.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use serde::Deserialize;
use tracing::instrument;

use kanak_core::checkout::CartQuantity;
use kanak_core::{CartItemId, ProductId, UserId};

use crate::db::{CartRepository, OrderRepository};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::commerce::CartView;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).post(add).delete(clear))
        .route("/{item_id}", patch(update).delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub quantity: i32,
}

/// The user's cart with current totals.
pub(crate) async fn cart_view(state: &AppState, user_id: UserId) -> Result<CartView> {
    let (items, totals) = OrderRepository::new(state.pool())
        .quote(user_id, None, &state.rules().shipping)
        .await?;
    Ok(CartView { items, totals })
}

/// GET /api/cart
async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<CartView>> {
    Ok(Json(cart_view(&state, user.id).await?))
}

/// Add a product, merging with an existing line.
///
/// POST /api/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddRequest>,
) -> Result<Json<CartView>> {
    let quantity = req.quantity.map_or_else(CartQuantity::default, CartQuantity::clamped);
    CartRepository::new(state.pool())
        .add(user.id, req.product_id, quantity)
        .await?;
    Ok(Json(cart_view(&state, user.id).await?))
}

/// Set a line's quantity. Anything below one becomes one.
///
/// PATCH /api/cart/{item_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool())
        .set_quantity(user.id, item_id, CartQuantity::clamped(req.quantity))
        .await?;
    Ok(Json(cart_view(&state, user.id).await?))
}

/// DELETE /api/cart/{item_id}
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    CartRepository::new(state.pool()).remove(user.id, item_id).await?;
    Ok(Json(cart_view(&state, user.id).await?))
}

/// DELETE /api/cart
async fn clear(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<CartView>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(cart_view(&state, user.id).await?))
}
