//! Old-jewelry exchange: estimates and customer requests.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kanak_core::pricing::{PricingError, exchange_estimate, metal_value};
use kanak_core::{MetalType, Purity};

use crate::db::ExchangeRepository;
use crate::db::exchange::NewExchangeRequest;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::workflows::ExchangeRequest;
use crate::routes::validation::{optional, purity_matches, required, weight};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/estimate", get(estimate))
        .route("/requests", get(list).post(create))
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Estimate {
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    /// Hallmark fraction of pure metal for the grade.
    pub fineness: Decimal,
    pub rate_per_gram: Decimal,
    /// Value before the deduction.
    pub metal_value: Decimal,
    pub deduction_percent: u32,
    pub estimated_value: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    pub description: String,
    pub image_url: Option<String>,
}

/// Value the piece at today's rate less the configured deduction.
async fn price_piece(
    state: &AppState,
    metal: MetalType,
    purity: Purity,
    weight_grams: Decimal,
) -> Result<Estimate> {
    purity_matches(metal, purity)?;
    weight("weight_grams", weight_grams)?;

    let rate_per_gram = state
        .rates()
        .rate_for(state.pool(), purity, state.rules().today())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No market rate published for {purity}")))?;
    let deduction_percent = state.rules().exchange_deduction_percent;
    let too_large = |e: PricingError| AppError::BadRequest(e.to_string());

    Ok(Estimate {
        metal,
        purity,
        weight_grams,
        fineness: purity.fineness(),
        rate_per_gram,
        metal_value: metal_value(weight_grams, rate_per_gram).map_err(too_large)?,
        deduction_percent,
        estimated_value: exchange_estimate(weight_grams, rate_per_gram, deduction_percent)
            .map_err(too_large)?,
    })
}

/// GET /api/exchange/estimate
async fn estimate(
    State(state): State<AppState>,
    Query(query): Query<EstimateQuery>,
) -> Result<Json<Estimate>> {
    let estimate = price_piece(&state, query.metal, query.purity, query.weight_grams).await?;
    Ok(Json(estimate))
}

/// Submit a piece for appraisal.
///
/// POST /api/exchange/requests
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<ExchangeRequest>)> {
    let description = required("description", &req.description)?;
    let estimate = price_piece(&state, req.metal, req.purity, req.weight_grams).await?;

    let request = ExchangeRepository::new(state.pool())
        .create(&NewExchangeRequest {
            user_id: user.id,
            metal: req.metal,
            purity: req.purity,
            weight_grams: req.weight_grams,
            description,
            image_url: optional(req.image_url.as_deref()),
            estimated_value: estimate.estimated_value,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/exchange/requests
async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ExchangeRequest>>> {
    let requests = ExchangeRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(requests))
}
