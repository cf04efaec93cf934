//! Market-rate publishing.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use kanak_core::{MetalType, Purity};

use crate::db::MarketRateRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::catalog::MarketRate;
use crate::routes::validation::{positive_money, purity_matches};
use crate::state::AppState;

const DEFAULT_HISTORY: i64 = 90;
const MAX_HISTORY: i64 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/market-rates", post(publish))
        .route("/market-rates/history", get(history))
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub metal: MetalType,
    pub purity: Purity,
    pub rate_per_gram: Decimal,
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub metal: Option<MetalType>,
    pub purity: Option<Purity>,
    pub limit: Option<i64>,
}

/// Record a rate and drop the cached board.
///
/// POST /api/admin/market-rates
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn publish(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<PublishRequest>,
) -> Result<(StatusCode, Json<MarketRate>)> {
    purity_matches(req.metal, req.purity)?;
    positive_money("rate_per_gram", req.rate_per_gram)?;

    let effective_date = req.effective_date.unwrap_or_else(|| state.rules().today());
    let rate = MarketRateRepository::new(state.pool())
        .insert(req.purity, req.rate_per_gram, effective_date, Some(admin.id))
        .await?;
    state.rates().invalidate().await;

    tracing::info!(purity = %rate.purity, rate = %rate.rate_per_gram, "Market rate published");
    Ok((StatusCode::CREATED, Json(rate)))
}

/// GET /api/admin/market-rates/history
async fn history(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MarketRate>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
    let rates = MarketRateRepository::new(state.pool())
        .history(query.metal, query.purity, limit)
        .await?;
    Ok(Json(rates))
}
