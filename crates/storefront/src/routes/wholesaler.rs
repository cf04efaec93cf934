//! Wholesaler design submissions.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use crate::db::DesignRepository;
use crate::db::designs::DesignInput;
use crate::error::Result;
use crate::middleware::RequireWholesaler;
use crate::models::workflows::WholesalerDesign;
use crate::routes::validation::{positive_money, purity_matches, required, weight};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/designs", get(list).post(submit))
}

/// POST /api/wholesaler/designs
#[instrument(skip(state, user, input), fields(wholesaler_id = %user.id))]
async fn submit(
    State(state): State<AppState>,
    RequireWholesaler(user): RequireWholesaler,
    Json(input): Json<DesignInput>,
) -> Result<(StatusCode, Json<WholesalerDesign>)> {
    required("title", &input.title)?;
    purity_matches(input.metal, input.purity)?;
    weight("weight_grams", input.weight_grams)?;
    positive_money("wholesale_price", input.wholesale_price)?;

    let design = DesignRepository::new(state.pool()).create(user.id, &input).await?;
    Ok((StatusCode::CREATED, Json(design)))
}

/// The caller's own submissions.
///
/// GET /api/wholesaler/designs
async fn list(
    State(state): State<AppState>,
    RequireWholesaler(user): RequireWholesaler,
) -> Result<Json<Vec<WholesalerDesign>>> {
    let designs = DesignRepository::new(state.pool())
        .list(Some(user.id), None)
        .await?;
    Ok(Json(designs))
}
