//! Domain service for the dashboard and system-level reads.

use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::db::{CategoryCount, LabelCount, Totals};
use crate::models::asset::Asset;
use crate::models::audit::AuditEntry;

/// Errors specific to system operations.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SystemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub totals: Totals,
    pub by_status: Vec<LabelCount>,
    pub by_type: Vec<LabelCount>,
    pub by_category: Vec<CategoryCount>,
    pub warranty_window_days: i64,
    pub expiring_warranties: Vec<Asset>,
    pub recent_activity: Vec<AuditEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: bool,
    pub directory_enabled: bool,
    pub directory_kind: Option<String>,
    pub session_store: String,
}

/// Domain service trait for system operations.
#[async_trait::async_trait]
pub trait SystemService: Send + Sync {
    /// Aggregates for the dashboard: totals, breakdowns, warranties ending
    /// within the configured window and the latest audit entries.
    async fn dashboard(&self) -> Result<DashboardStats, SystemError>;

    /// Never fails on a database outage; `database` is reported as `false` instead.
    async fn status(&self, uptime_secs: u64, version: &str) -> SystemStatus;

    /// Current configuration with secrets replaced by a mask.
    fn redacted_config(&self) -> Config;
}
