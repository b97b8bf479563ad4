//! Domain service for spreadsheet imports and saved column mappings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::Actor;
use crate::import::MappingSuggestion;
use crate::models::import_template::{ImportTemplate, ImportTemplateInput};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("Invalid mapping: {}", .0.join("; "))]
    InvalidMapping(Vec<String>),

    #[error("Import template not found: {0}")]
    TemplateNotFound(i32),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ImportError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ImportError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::Conflict(crate::db::UNIQUE_CONFLICT.to_string());
        }
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub delimiter: char,
    pub suggestions: Vec<MappingSuggestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub csv: String,
    /// `column -> field`. Ignored when `template_id` is given.
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
    pub template_id: Option<i32>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub create_missing_categories: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// Row was stored.
    Created,
    /// Dry run: row would be stored.
    Valid,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub line: usize,
    pub status: RowStatus,
    pub asset_tag: Option<String>,
    pub asset_id: Option<i32>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Categories created by the run (or that would be, for a dry run).
    pub categories_created: Vec<String>,
    pub rows: Vec<RowOutcome>,
}

#[async_trait::async_trait]
pub trait ImportService: Send + Sync {
    /// Headers, sample rows and suggested mappings for raw CSV text.
    async fn preview(&self, csv: &str) -> Result<ImportPreview, ImportError>;

    /// Imports assets row by row. A failing row is reported and never
    /// prevents the others from being stored.
    ///
    /// # Errors
    ///
    /// Only document-level problems (unreadable CSV, invalid mapping) fail the whole call.
    async fn import_assets(
        &self,
        request: ImportRequest,
        actor: &Actor,
    ) -> Result<ImportReport, ImportError>;

    async fn list_templates(&self) -> Result<Vec<ImportTemplate>, ImportError>;

    async fn create_template(
        &self,
        input: ImportTemplateInput,
        actor: &Actor,
    ) -> Result<ImportTemplate, ImportError>;

    async fn update_template(
        &self,
        id: i32,
        input: ImportTemplateInput,
        actor: &Actor,
    ) -> Result<ImportTemplate, ImportError>;

    async fn delete_template(&self, id: i32, actor: &Actor) -> Result<(), ImportError>;
}
