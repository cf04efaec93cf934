//! Stock levels, manual movements, and counter sales.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use kanak_core::{PaymentMethod, ProductId, StockMovementKind};

use crate::db::offline_sales::NewOfflineSale;
use crate::db::{OfflineSaleRepository, StockRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ledger::{OfflineSale, StockLevel, StockMovement};
use crate::routes::validation::{money, optional};
use crate::state::AppState;

const DEFAULT_MOVEMENTS: i64 = 100;
const MAX_MOVEMENTS: i64 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock", get(levels))
        .route("/stock/movements", get(movements).post(record_movement))
        .route("/offline-sales", get(list_sales).post(record_sale))
}

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    #[serde(default)]
    pub low_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub product_id: Option<ProductId>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub kind: StockMovementKind,
    pub quantity_delta: i32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub sold_at: Option<DateTime<Utc>>,
}

/// Store-local dates; `to` is inclusive. Defaults to today.
#[derive(Debug, Deserialize)]
pub struct SaleRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/admin/stock
async fn levels(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<LevelQuery>,
) -> Result<Json<Vec<StockLevel>>> {
    let levels = StockRepository::new(state.pool())
        .levels(state.rules().low_stock_threshold, query.low_only)
        .await?;
    Ok(Json(levels))
}

/// GET /api/admin/stock/movements
async fn movements(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<MovementQuery>,
) -> Result<Json<Vec<StockMovement>>> {
    let limit = query.limit.unwrap_or(DEFAULT_MOVEMENTS).clamp(1, MAX_MOVEMENTS);
    let movements = StockRepository::new(state.pool())
        .movements(query.product_id, limit)
        .await?;
    Ok(Json(movements))
}

/// Inward, adjustment, or return. Sales write their own movements.
///
/// POST /api/admin/stock/movements
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, product_id = %req.product_id))]
async fn record_movement(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<MovementRequest>,
) -> Result<(StatusCode, Json<StockMovement>)> {
    let movement = StockRepository::new(state.pool())
        .record(
            req.product_id,
            req.kind,
            req.quantity_delta,
            optional(req.note.as_deref()),
            admin.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST /api/admin/offline-sales
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, product_id = %req.product_id))]
async fn record_sale(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<SaleRequest>,
) -> Result<(StatusCode, Json<OfflineSale>)> {
    if let Some(price) = req.unit_price {
        money("unit_price", price)?;
    }

    let sale = OfflineSaleRepository::new(state.pool())
        .record(
            &NewOfflineSale {
                product_id: req.product_id,
                quantity: req.quantity,
                unit_price: req.unit_price,
                payment_method: req.payment_method,
                customer_name: optional(req.customer_name.as_deref()),
                customer_phone: optional(req.customer_phone.as_deref()),
                sold_at: req.sold_at,
            },
            admin.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET /api/admin/offline-sales
async fn list_sales(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(range): Query<SaleRange>,
) -> Result<Json<Vec<OfflineSale>>> {
    let today = state.rules().today();
    let from = range.from.unwrap_or(today);
    let to = range.to.unwrap_or(from);
    if to < from {
        return Err(AppError::BadRequest("to must not be before from".to_string()));
    }
    let (start, end) = state
        .rules()
        .day_span(from, to)
        .ok_or_else(|| AppError::BadRequest("date out of range".to_string()))?;

    let sales = OfflineSaleRepository::new(state.pool())
        .list(start, end)
        .await?;
    Ok(Json(sales))
}
