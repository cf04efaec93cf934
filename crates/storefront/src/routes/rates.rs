//! Public market-rate board.

use axum::{Json, Router, extract::State, routing::get};

use crate::error::Result;
use crate::models::catalog::MarketRate;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/market-rates", get(current))
}

/// Latest rate per metal and purity.
///
/// GET /api/market-rates
async fn current(State(state): State<AppState>) -> Result<Json<Vec<MarketRate>>> {
    let rates = state
        .rates()
        .current(state.pool(), state.rules().today())
        .await?;
    Ok(Json(rates.as_ref().clone()))
}
