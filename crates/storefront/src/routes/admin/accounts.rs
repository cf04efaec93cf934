//! User roles and Gullak oversight.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;
use tracing::instrument;

use kanak_core::{GullakStatus, MetalType, UserId, UserRole};

use crate::db::{GullakRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::models::gullak::GullakAccount;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/role", patch(set_role))
        .route("/gullak/accounts", get(list_gullak))
}

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct GullakFilter {
    pub status: Option<GullakStatus>,
    pub metal: Option<MetalType>,
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list(filter.role).await?))
}

/// Takes effect at the user's next login.
///
/// PATCH /api/admin/users/{id}/role
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(change): Json<RoleChange>,
) -> Result<Json<User>> {
    if id == admin.id && change.role != UserRole::Admin {
        return Err(AppError::Conflict(
            "Admins can't remove their own admin role".to_string(),
        ));
    }
    let user = UserRepository::new(state.pool())
        .set_role(id, change.role)
        .await?;
    tracing::info!(user_id = %user.id, role = %user.role, "Role changed");
    Ok(Json(user))
}

/// GET /api/admin/gullak/accounts
async fn list_gullak(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<GullakFilter>,
) -> Result<Json<Vec<GullakAccount>>> {
    let accounts = GullakRepository::new(state.pool())
        .list(filter.status, filter.metal)
        .await?;
    Ok(Json(accounts))
}
