//! Local account management. Admin only.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Role;
use crate::models::user::{NewUser, User};
use crate::services::auth_service::RoleUpdate;

/// `GET /api/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    current.require(Role::Admin)?;
    let users = state.auth_service().list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(payload): Json<NewUser>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    current.require(Role::Admin)?;
    let user = state
        .auth_service()
        .create_user(payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `PUT /api/users/{id}/role`
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    current.require(Role::Admin)?;
    let id = validate_id("user", id)?;

    let user = state
        .auth_service()
        .update_role(id, payload.role, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    current.require(Role::Admin)?;
    let id = validate_id("user", id)?;

    state
        .auth_service()
        .delete_user(id, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(())))
}
