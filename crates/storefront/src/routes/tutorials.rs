//! Published jewelry care tutorials.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

use kanak_core::MetalType;

use crate::db::TutorialRepository;
use crate::error::{AppError, Result};
use crate::models::catalog::CareTutorial;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{slug}", get(show))
}

#[derive(Debug, Deserialize)]
pub struct TutorialQuery {
    pub metal: Option<MetalType>,
}

/// GET /api/care-tutorials
async fn list(
    State(state): State<AppState>,
    Query(query): Query<TutorialQuery>,
) -> Result<Json<Vec<CareTutorial>>> {
    let tutorials = TutorialRepository::new(state.pool())
        .list_published(query.metal)
        .await?;
    Ok(Json(tutorials))
}

/// GET /api/care-tutorials/{slug}
async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<CareTutorial>> {
    TutorialRepository::new(state.pool())
        .get_published(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Tutorial not found".to_string()))
}
