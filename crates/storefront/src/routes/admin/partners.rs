//! Corporate registration and wholesaler design review.
//!
//! Both leave `pending` exactly once; a second review answers 409.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use kanak_core::{CorporateRegistrationId, DesignId, ReviewStatus};

use crate::db::{CorporateRepository, DesignRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::workflows::{CorporateRegistration, WholesalerDesign};
use crate::routes::validation::optional;
use crate::state::AppState;

/// Largest corporate discount, in percent.
const MAX_DISCOUNT_PERCENT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/corporate/registrations", get(list_registrations))
        .route(
            "/corporate/registrations/{id}/approve",
            post(approve_registration),
        )
        .route(
            "/corporate/registrations/{id}/reject",
            post(reject_registration),
        )
        .route("/wholesaler/designs", get(list_designs))
        .route("/wholesaler/designs/{id}/approve", post(approve_design))
        .route("/wholesaler/designs/{id}/reject", post(reject_design))
}

#[derive(Debug, Deserialize)]
pub struct ReviewFilter {
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRegistration {
    pub discount_percent: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewNote {
    pub note: Option<String>,
}

fn check_discount(percent: Decimal) -> Result<()> {
    if percent <= Decimal::ZERO || percent > MAX_DISCOUNT_PERCENT {
        return Err(AppError::BadRequest(format!(
            "discount_percent must be above 0 and at most {MAX_DISCOUNT_PERCENT}"
        )));
    }
    Ok(())
}

fn note_of(body: Option<Json<ReviewNote>>) -> ReviewNote {
    body.map(|Json(note)| note).unwrap_or_default()
}

/// GET /api/admin/corporate/registrations
async fn list_registrations(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<CorporateRegistration>>> {
    Ok(Json(CorporateRepository::new(state.pool()).list(filter.status).await?))
}

/// POST /api/admin/corporate/registrations/{id}/approve
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
async fn approve_registration(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CorporateRegistrationId>,
    Json(req): Json<ApproveRegistration>,
) -> Result<Json<CorporateRegistration>> {
    check_discount(req.discount_percent)?;
    let registration = CorporateRepository::new(state.pool())
        .review(
            id,
            ReviewStatus::Approved,
            Some(req.discount_percent),
            optional(req.note.as_deref()),
            admin.id,
        )
        .await?;
    Ok(Json(registration))
}

/// POST /api/admin/corporate/registrations/{id}/reject
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
async fn reject_registration(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CorporateRegistrationId>,
    body: Option<Json<ReviewNote>>,
) -> Result<Json<CorporateRegistration>> {
    let note = note_of(body);
    let registration = CorporateRepository::new(state.pool())
        .review(
            id,
            ReviewStatus::Rejected,
            None,
            optional(note.note.as_deref()),
            admin.id,
        )
        .await?;
    Ok(Json(registration))
}

/// GET /api/admin/wholesaler/designs
async fn list_designs(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<WholesalerDesign>>> {
    Ok(Json(
        DesignRepository::new(state.pool())
            .list(None, filter.status)
            .await?,
    ))
}

async fn review_design(
    state: &AppState,
    id: DesignId,
    decision: ReviewStatus,
    body: Option<Json<ReviewNote>>,
    reviewer: kanak_core::UserId,
) -> Result<Json<WholesalerDesign>> {
    let note = note_of(body);
    let design = DesignRepository::new(state.pool())
        .review(id, decision, optional(note.note.as_deref()), reviewer)
        .await?;
    Ok(Json(design))
}

/// POST /api/admin/wholesaler/designs/{id}/approve
async fn approve_design(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DesignId>,
    body: Option<Json<ReviewNote>>,
) -> Result<Json<WholesalerDesign>> {
    review_design(&state, id, ReviewStatus::Approved, body, admin.id).await
}

/// POST /api/admin/wholesaler/designs/{id}/reject
async fn reject_design(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DesignId>,
    body: Option<Json<ReviewNote>>,
) -> Result<Json<WholesalerDesign>> {
    review_design(&state, id, ReviewStatus::Rejected, body, admin.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_bounds() {
        assert!(check_discount(Decimal::ZERO).is_err());
        assert!(check_discount(Decimal::new(5, 1)).is_ok());
        assert!(check_discount(Decimal::new(50, 0)).is_ok());
        assert!(check_discount(Decimal::new(5001, 2)).is_err());
    }
}
