use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_id, validate_page, validate_search_query};
use super::{ApiError, ApiResponse, AppState, PageQuery};
use crate::domain::{AuditAction, EntityType};
use crate::models::Page;
use crate::models::audit::{AuditEntry, AuditFilter};
use crate::services::ExportFormat;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub action: Option<String>,
    pub actor: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Export only: `json` (default) or `csv`.
    pub format: Option<String>,
}

impl AuditQuery {
    fn filter(&self) -> Result<AuditFilter, ApiError> {
        let entity_type = validate_search_query(self.entity_type.clone())
            .map(|raw| {
                raw.to_ascii_lowercase().parse::<EntityType>()
                    .map(|t| t.as_str().to_string())
                    .map_err(ApiError::validation)
            })
            .transpose()?;

        let action = validate_search_query(self.action.clone())
            .map(|raw| {
                raw.to_ascii_lowercase().parse::<AuditAction>()
                    .map(|a| a.as_str().to_string())
                    .map_err(ApiError::validation)
            })
            .transpose()?;

        let from = validate_search_query(self.from.clone());
        let to = validate_search_query(self.to.clone());
        for bound in [&from, &to].into_iter().flatten() {
            if !is_date_bound(bound) {
                return Err(ApiError::validation(format!(
                    "Invalid date '{bound}'. Expected YYYY-MM-DD or RFC 3339"
                )));
            }
        }

        Ok(AuditFilter {
            entity_type,
            entity_id: self.entity_id,
            action,
            actor: validate_search_query(self.actor.clone()),
            from,
            to,
        })
    }
}

fn is_date_bound(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || chrono::DateTime::parse_from_rfc3339(value).is_ok()
}

/// `GET /api/audit`
pub async fn list_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<ApiResponse<Page<AuditEntry>>>, ApiError> {
    let filter = query.filter()?;
    let (page, page_size) = validate_page(PageQuery {
        page: query.page,
        page_size: query.page_size,
    })?;

    let entries = state
        .shared
        .audit
        .list(&filter, page, page_size)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
    Ok(Json(ApiResponse::success(entries)))
}

/// `GET /api/audit/{id}`
pub async fn get_audit_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AuditEntry>>, ApiError> {
    let id = validate_id("audit entry", id)?;
    let entry = state
        .shared
        .audit
        .get(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Audit entry", id))?;
    Ok(Json(ApiResponse::success(entry)))
}

/// `GET /api/audit/export?format=csv`
pub async fn export_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter()?;
    let format = match validate_search_query(query.format.clone()) {
        Some(raw) => raw.parse::<ExportFormat>().map_err(ApiError::validation)?,
        None => ExportFormat::default(),
    };

    let (body, content_type) = state
        .shared
        .audit
        .export(&filter, format)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let disposition = match format {
        ExportFormat::Json => "attachment; filename=\"audit.json\"",
        ExportFormat::Csv => "attachment; filename=\"audit.csv\"",
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_normalizes_entity_and_action() {
        let query = AuditQuery {
            entity_type: Some("asset".to_string()),
            action: Some("ASSIGN".to_string()),
            from: Some("2024-01-01".to_string()),
            ..AuditQuery::default()
        };

        let filter = query.filter().unwrap();
        assert_eq!(filter.entity_type.as_deref(), Some("asset"));
        assert_eq!(filter.action.as_deref(), Some("assign"));
    }

    #[test]
    fn test_filter_rejects_bad_dates() {
        let query = AuditQuery {
            to: Some("yesterday".to_string()),
            ..AuditQuery::default()
        };
        assert!(query.filter().is_err());
    }
}
