//! Order fulfilment.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;
use tracing::instrument;

use kanak_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::commerce::{Order, OrderDetail};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", patch(set_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

/// GET /api/admin/orders
async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list(filter.status).await?))
}

/// GET /api/admin/orders/{id}
async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    Ok(Json(OrderRepository::new(state.pool()).get_detail(id, None).await?))
}

/// Move an order along its lifecycle. Cancelling restocks it.
///
/// PATCH /api/admin/orders/{id}/status
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .change_status(id, change.status, None, admin.id)
        .await?;
    Ok(Json(order))
}
