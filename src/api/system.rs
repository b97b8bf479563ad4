//! System API endpoints.
//!
//! Status and configuration reads are delegated to [`SystemService`](crate::services::SystemService).

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::config::Config;
use crate::domain::Role;
use crate::services::{SystemError, SystemStatus};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

impl From<SystemError> for ApiError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::Database(msg) => Self::DatabaseError(msg),
            SystemError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/system/status`
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatus>> {
    let status = state
        .system_service()
        .status(
            state.start_time.elapsed().as_secs(),
            env!("CARGO_PKG_VERSION"),
        )
        .await;

    Json(ApiResponse::success(status))
}

/// `GET /api/system/config`
///
/// Passwords are replaced with a mask.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<Config>>, ApiError> {
    current.require(Role::Admin)?;
    Ok(Json(ApiResponse::success(
        state.system_service().redacted_config(),
    )))
}

/// `GET /api/health`
///
/// Unauthenticated. Answers 503 while the database is unreachable.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(ApiResponse::success(HealthResponse { status, database })),
    )
        .into_response()
}
