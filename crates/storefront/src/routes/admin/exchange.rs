//! Exchange request appraisal.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use kanak_core::{ExchangeRequestId, ReviewStatus};

use crate::db::ExchangeRepository;
use crate::db::exchange::ExchangeDecision;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::workflows::ExchangeRequest;
use crate::routes::validation::{optional, positive_money};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/exchange/requests", get(list))
        .route("/exchange/requests/{id}/approve", post(approve))
        .route("/exchange/requests/{id}/reject", post(reject))
}

#[derive(Debug, Deserialize)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub appraised_value: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub note: Option<String>,
}

/// GET /api/admin/exchange/requests
async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<ExchangeRequest>>> {
    Ok(Json(ExchangeRepository::new(state.pool()).list(filter.status).await?))
}

/// POST /api/admin/exchange/requests/{id}/approve
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ExchangeRequestId>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<ExchangeRequest>> {
    positive_money("appraised_value", req.appraised_value)?;
    let decision = ExchangeDecision::Approve {
        appraised_value: req.appraised_value,
        note: optional(req.note.as_deref()),
    };
    let request = ExchangeRepository::new(state.pool())
        .review(id, decision, admin.id)
        .await?;
    Ok(Json(request))
}

/// POST /api/admin/exchange/requests/{id}/reject
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ExchangeRequestId>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<ExchangeRequest>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let decision = ExchangeDecision::Reject {
        note: optional(req.note.as_deref()),
    };
    let request = ExchangeRepository::new(state.pool())
        .review(id, decision, admin.id)
        .await?;
    Ok(Json(request))
}
