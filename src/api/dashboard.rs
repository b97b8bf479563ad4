use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::DashboardStats;

/// `GET /api/dashboard/stats`
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let stats = state.system_service().dashboard().await?;
    Ok(Json(ApiResponse::success(stats)))
}
