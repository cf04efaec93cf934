//! Gullak savings plans: calculator and customer accounts.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kanak_core::gullak::{GullakPlan, Projection, project};
use kanak_core::{GullakAccountId, MetalType, PaymentFrequency, Purity};

use crate::db::gullak::PlanChange;
use crate::db::{GullakRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::gullak::{GullakAccount, GullakAccountDetail, GullakPayment};
use crate::routes::validation::{positive_money, purity_matches, weight};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculator", get(calculator))
        .route("/accounts", get(list).post(open))
        .route("/accounts/{id}", get(show))
        .route("/accounts/{id}/payments", post(pay))
        .route("/accounts/{id}/pause", post(pause))
        .route("/accounts/{id}/resume", post(resume))
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub metal: MetalType,
    pub purity: Purity,
    pub target_grams: Decimal,
    pub installment_amount: Decimal,
    pub frequency: PaymentFrequency,
    pub start_date: Option<NaiveDate>,
}

impl PlanRequest {
    fn validate(&self) -> Result<()> {
        purity_matches(self.metal, self.purity)?;
        weight("target_grams", self.target_grams)?;
        positive_money("installment_amount", self.installment_amount)
    }
}

#[derive(Debug, Serialize)]
pub struct CalculatorResponse {
    pub rate_per_gram: Decimal,
    #[serde(flatten)]
    pub projection: Projection,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub account: GullakAccount,
    pub payment: GullakPayment,
}

async fn current_rate(state: &AppState, purity: Purity) -> Result<Decimal> {
    state
        .rates()
        .rate_for(state.pool(), purity, state.rules().today())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No market rate published for {purity}")))
}

/// How long a plan takes at today's rate.
///
/// GET /api/gullak/calculator
async fn calculator(
    State(state): State<AppState>,
    Query(req): Query<PlanRequest>,
) -> Result<Json<CalculatorResponse>> {
    req.validate()?;
    let rate_per_gram = current_rate(&state, req.purity).await?;
    let projection = project(
        req.target_grams,
        rate_per_gram,
        req.installment_amount,
        req.frequency,
        req.start_date.unwrap_or_else(|| state.rules().today()),
    )
    .map_err(RepositoryError::from)?;

    Ok(Json(CalculatorResponse {
        rate_per_gram,
        projection,
    }))
}

/// POST /api/gullak/accounts
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn open(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<PlanRequest>,
) -> Result<(StatusCode, Json<GullakAccount>)> {
    req.validate()?;
    let today = state.rules().today();
    let start_date = req.start_date.unwrap_or(today);
    if start_date < today {
        return Err(AppError::BadRequest("start_date must not be in the past".to_string()));
    }

    let plan = GullakPlan::open(
        req.target_grams,
        req.installment_amount,
        req.frequency,
        start_date,
    )
    .map_err(RepositoryError::from)?;

    let account = GullakRepository::new(state.pool())
        .create(user.id, req.purity, &plan, start_date)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /api/gullak/accounts
async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<GullakAccount>>> {
    Ok(Json(
        GullakRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// GET /api/gullak/accounts/{id}
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GullakAccountId>,
) -> Result<Json<GullakAccountDetail>> {
    let detail = GullakRepository::new(state.pool())
        .get_detail(id, Some(user.id))
        .await?;
    Ok(Json(detail))
}

/// Pay an installment at today's rate.
///
/// POST /api/gullak/accounts/{id}/payments
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn pay(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GullakAccountId>,
    Json(req): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>)> {
    positive_money("amount", req.amount)?;
    let repo = GullakRepository::new(state.pool());
    let purity = repo.get_detail(id, Some(user.id)).await?.account.purity;
    let rate_per_gram = current_rate(&state, purity).await?;

    let (account, payment) = repo
        .record_payment(id, user.id, req.amount, rate_per_gram, state.rules().today())
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse { account, payment })))
}

/// POST /api/gullak/accounts/{id}/pause
async fn pause(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GullakAccountId>,
) -> Result<Json<GullakAccount>> {
    let account = GullakRepository::new(state.pool())
        .change(id, user.id, PlanChange::Pause)
        .await?;
    Ok(Json(account))
}

/// Missed installments are skipped, not owed.
///
/// POST /api/gullak/accounts/{id}/resume
async fn resume(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<GullakAccountId>,
) -> Result<Json<GullakAccount>> {
    let today = state.rules().today();
    let account = GullakRepository::new(state.pool())
        .change(id, user.id, PlanChange::Resume { today })
        .await?;
    Ok(Json(account))
}
