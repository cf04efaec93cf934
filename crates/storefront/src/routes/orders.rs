//! Checkout and customer order handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use kanak_core::checkout::CheckoutTotals;
use kanak_core::{ExchangeRequestId, OrderId, OrderStatus, PaymentMethod};

use crate::db::OrderRepository;
use crate::db::orders::NewOrder;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::commerce::{Order, OrderDetail};
use crate::routes::validation::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout/quote", post(quote))
        .route("/orders", get(list).post(place))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/cancel", post(cancel))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteRequest {
    pub exchange_request_id: Option<ExchangeRequestId>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping_address: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub exchange_request_id: Option<ExchangeRequestId>,
}

/// Price the cart, optionally spending exchange credit.
///
/// POST /api/checkout/quote
async fn quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: Option<Json<QuoteRequest>>,
) -> Result<Json<CheckoutTotals>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let (_, totals) = OrderRepository::new(state.pool())
        .quote(user.id, req.exchange_request_id, &state.rules().shipping)
        .await?;
    Ok(Json(totals))
}

/// Turn the cart into an order.
///
/// POST /api/orders
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let shipping_address = required("shipping_address", &req.shipping_address)?;
    let phone = required("phone", &req.phone)?;

    let order = OrderRepository::new(state.pool())
        .place(
            &NewOrder {
                user_id: user.id,
                shipping_address,
                phone,
                payment_method: req.payment_method,
                exchange_request_id: req.exchange_request_id,
            },
            &state.rules().shipping,
            state.rules().today(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
async fn list(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_for_user(user.id).await?;
    Ok(Json(orders))
}

/// Another user's order is reported as missing.
///
/// GET /api/orders/{id}
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get_detail(id, Some(user.id))
        .await?;
    Ok(Json(order))
}

/// Customers may cancel while the order is still pending.
///
/// POST /api/orders/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .change_status(id, OrderStatus::Cancelled, Some(user.id), user.id)
        .await?;
    Ok(Json(order))
}
