//! Care tutorial editing.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
};

use kanak_core::TutorialId;

use crate::db::TutorialRepository;
use crate::db::tutorials::TutorialInput;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::catalog::CareTutorial;
use crate::routes::validation::required;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/care-tutorials", post(create))
        .route("/care-tutorials/{id}", put(update).delete(remove))
}

fn validate(input: &TutorialInput) -> Result<()> {
    required("title", &input.title)?;
    required("slug", &input.slug)?;
    required("body", &input.body)?;
    Ok(())
}

/// POST /api/admin/care-tutorials
async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<TutorialInput>,
) -> Result<(StatusCode, Json<CareTutorial>)> {
    validate(&input)?;
    let tutorial = TutorialRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(tutorial)))
}

/// PUT /api/admin/care-tutorials/{id}
async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<TutorialId>,
    Json(input): Json<TutorialInput>,
) -> Result<Json<CareTutorial>> {
    validate(&input)?;
    let tutorial = TutorialRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(Json(tutorial))
}

/// DELETE /api/admin/care-tutorials/{id}
async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<TutorialId>,
) -> Result<StatusCode> {
    TutorialRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
