//! Spreadsheet import endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Role;
use crate::models::import_template::{ImportTemplate, ImportTemplateInput};
use crate::services::import_service::{ImportError, ImportPreview};
use crate::services::{ImportReport, ImportRequest};

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidCsv(msg) => Self::validation(format!("Invalid CSV: {msg}")),
            ImportError::InvalidMapping(errors) => {
                Self::validation(format!("Invalid mapping: {}", errors.join("; ")))
            }
            ImportError::TemplateNotFound(id) => Self::not_found("Import template", id),
            ImportError::Conflict(msg) => Self::Conflict(msg),
            ImportError::Validation(msg) => Self::validation(msg),
            ImportError::Database(msg) => Self::DatabaseError(msg),
            ImportError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `POST /api/import/preview`
///
/// Body is the raw CSV text.
pub async fn preview_import(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    body: String,
) -> Result<Json<ApiResponse<ImportPreview>>, ApiError> {
    current.require(Role::Manager)?;
    if body.trim().is_empty() {
        return Err(ApiError::validation("Request body must contain CSV text"));
    }

    let preview = state.import_service().preview(&body).await?;
    Ok(Json(ApiResponse::success(preview)))
}

/// `POST /api/import/assets`
pub async fn import_assets(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    current.require(Role::Manager)?;
    let report = state
        .import_service()
        .import_assets(payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// `GET /api/import/templates`
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ImportTemplate>>>, ApiError> {
    let templates = state.import_service().list_templates().await?;
    Ok(Json(ApiResponse::success(templates)))
}

pub async fn create_template(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(payload): Json<ImportTemplateInput>,
) -> Result<Json<ApiResponse<ImportTemplate>>, ApiError> {
    current.require(Role::Manager)?;
    let template = state
        .import_service()
        .create_template(payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

pub async fn update_template(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<ImportTemplateInput>,
) -> Result<Json<ApiResponse<ImportTemplate>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("import template", id)?;
    let template = state
        .import_service()
        .update_template(id, payload, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(template)))
}

pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    current.require(Role::Manager)?;
    let id = validate_id("import template", id)?;
    state
        .import_service()
        .delete_template(id, &current.actor())
        .await?;
    Ok(Json(ApiResponse::success(())))
}
