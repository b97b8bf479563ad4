use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Role;
use crate::models::category::{Category, CategoryInput, CategoryNode, CategoryPatch, CategorySummary};
use crate::services::CategoryError;

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(id) => Self::not_found("Category", id),
            CategoryError::ParentNotFound(id) => {
                Self::validation(format!("Parent category {id} does not exist"))
            }
            CategoryError::Conflict(msg) => Self::Conflict(msg),
            CategoryError::Validation(msg) => Self::validation(msg),
            CategoryError::Database(msg) => Self::DatabaseError(msg),
            CategoryError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/categories`
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategorySummary>>>, ApiError> {
    let categories = state.category_service().list().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// `GET /api/categories/tree`
pub async fn category_tree(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>, ApiError> {
    let tree = state.category_service().tree().await?;
    Ok(Json(ApiResponse::success(tree)))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let id = validate_id("category", id)?;
    let category = state.category_service().get(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(payload): Json<CategoryInput>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    current.require(Role::Manager)?;
    let category = state
        .category_service()
        .create(payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryPatch>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("category", id)?;
    let category = state
        .category_service()
        .update(id, payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("category", id)?;
    state
        .category_service()
        .delete(id, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(())))
}
