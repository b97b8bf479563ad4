use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_id, validate_page, validate_search_query};
use super::{ApiError, ApiResponse, AppState, PageQuery};
use crate::domain::{AssetStatus, AssetType, Role};
use crate::models::Page;
use crate::models::asset::{Asset, AssetFilter, AssetInput, AssetPatch};
use crate::models::audit::AuditEntry;
use crate::services::AssetError;

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(id) => Self::not_found("Asset", id),
            AssetError::DuplicateTag(tag) => {
                Self::Conflict(format!("Asset tag '{tag}' is already in use"))
            }
            AssetError::CategoryNotFound(id) => {
                Self::validation(format!("Category {id} does not exist"))
            }
            AssetError::OwnerNotFound(id) => {
                Self::validation(format!("Directory user {id} does not exist"))
            }
            AssetError::Validation(msg) => Self::validation(msg),
            AssetError::Database(msg) => Self::DatabaseError(msg),
            AssetError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub status: Option<String>,
    pub asset_type: Option<String>,
    pub category_id: Option<i32>,
    pub assigned_to: Option<i32>,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl AssetQuery {
    fn filter(&self) -> Result<AssetFilter, ApiError> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<AssetStatus>)
            .transpose()
            .map_err(ApiError::validation)?;

        let asset_type = self
            .asset_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<AssetType>)
            .transpose()
            .map_err(ApiError::validation)?;

        Ok(AssetFilter {
            status,
            asset_type,
            category_id: self.category_id,
            assigned_to: self.assigned_to,
            q: validate_search_query(self.q.clone()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// `null` unassigns.
    pub directory_user_id: Option<i32>,
}

/// `GET /api/assets`
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssetQuery>,
) -> Result<Json<ApiResponse<Page<Asset>>>, ApiError> {
    let filter = query.filter()?;
    let (page, page_size) = validate_page(PageQuery {
        page: query.page,
        page_size: query.page_size,
    })?;

    let assets = state
        .asset_service()
        .list(&filter, page, page_size)
        .await?;
    Ok(Json(ApiResponse::success(assets)))
}

/// `GET /api/assets/{id}`
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    let id = validate_id("asset", id)?;
    let asset = state.asset_service().get(id).await?;
    Ok(Json(ApiResponse::success(asset)))
}

/// `POST /api/assets`
pub async fn create_asset(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(payload): Json<AssetInput>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    current.require(Role::Manager)?;
    let asset = state
        .asset_service()
        .create(payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(asset)))
}

/// `PUT /api/assets/{id}`
pub async fn update_asset(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<AssetPatch>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("asset", id)?;

    let asset = state
        .asset_service()
        .update(id, payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(asset)))
}

/// `DELETE /api/assets/{id}`
pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("asset", id)?;

    state.asset_service().delete(id, &current.actor()).await?;
    Ok(Json(ApiResponse::success(())))
}

/// `POST /api/assets/{id}/assign`
pub async fn assign_asset(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<ApiResponse<Asset>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("asset", id)?;

    let asset = state
        .asset_service()
        .assign(id, payload.directory_user_id, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(asset)))
}

/// `GET /api/assets/{id}/history`
pub async fn asset_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<AuditEntry>>>, ApiError> {
    let id = validate_id("asset", id)?;
    let history = state.asset_service().history(id).await?;
    Ok(Json(ApiResponse::success(history)))
}

/// `GET /api/assets/export`
///
/// Same filters as the list endpoint, without pagination.
pub async fn export_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter()?;
    let body = state.asset_service().export_csv(&filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"assets.csv\"",
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter_parses_lenient_values() {
        let query = AssetQuery {
            status: Some("In Use".to_string()),
            asset_type: Some("sw".to_string()),
            q: Some("  ".to_string()),
            ..AssetQuery::default()
        };

        let filter = query.filter().unwrap();
        assert_eq!(filter.status, Some(AssetStatus::Assigned));
        assert_eq!(filter.asset_type, Some(AssetType::Software));
        assert_eq!(filter.q, None);
    }

    #[test]
    fn test_query_filter_rejects_unknown_status() {
        let query = AssetQuery {
            status: Some("melted".to_string()),
            ..AssetQuery::default()
        };
        assert!(query.filter().is_err());
    }
}
