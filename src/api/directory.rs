//! Directory users and synchronization with the organizational directory.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_id, validate_search_query};
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Role;
use crate::models::asset::Asset;
use crate::models::directory_user::{
    DirectoryUser, DirectoryUserFilter, DirectoryUserInput, DirectoryUserPatch,
};
use crate::services::{DirectoryError, DirectoryStatus, SyncReport};

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(id) => Self::not_found("Directory user", id),
            DirectoryError::Conflict(msg) => Self::Conflict(msg),
            DirectoryError::Validation(msg) => Self::validation(msg),
            DirectoryError::Disabled => {
                Self::validation("Directory integration is not enabled")
            }
            DirectoryError::Directory(msg) => Self::directory_error(msg),
            DirectoryError::Database(msg) => Self::DatabaseError(msg),
            DirectoryError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/directory-users?q=&department=&active=`
pub async fn list_directory_users(
    State(state): State<Arc<AppState>>,
    Query(mut filter): Query<DirectoryUserFilter>,
) -> Result<Json<ApiResponse<Vec<DirectoryUser>>>, ApiError> {
    filter.q = validate_search_query(filter.q.take());
    filter.department = validate_search_query(filter.department.take());

    let users = state.directory_service().list(&filter).await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn get_directory_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DirectoryUser>>, ApiError> {
    let id = validate_id("directory user", id)?;
    let user = state.directory_service().get(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `GET /api/directory-users/{id}/assets`
pub async fn directory_user_assets(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<Asset>>>, ApiError> {
    let id = validate_id("directory user", id)?;
    let assets = state.directory_service().assets(id).await?;
    Ok(Json(ApiResponse::success(assets)))
}

pub async fn create_directory_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(payload): Json<DirectoryUserInput>,
) -> Result<Json<ApiResponse<DirectoryUser>>, ApiError> {
    current.require(Role::Manager)?;
    let user = state
        .directory_service()
        .create(payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_directory_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<DirectoryUserPatch>,
) -> Result<Json<ApiResponse<DirectoryUser>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("directory user", id)?;
    let user = state
        .directory_service()
        .update(id, payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_directory_user(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("directory user", id)?;
    state
        .directory_service()
        .delete(id, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(())))
}

/// `POST /api/directory/sync`
pub async fn sync_directory(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    current.require(Role::Admin)?;
    let report = state.directory_service().sync(&current.actor()).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// `GET /api/directory/status`
pub async fn directory_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DirectoryStatus>>, ApiError> {
    let status = state.directory_service().status().await?;
    Ok(Json(ApiResponse::success(status)))
}
