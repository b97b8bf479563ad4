//! Domain service for directory users: manual records plus synchronization
//! from the organizational directory.

use serde::Serialize;
use thiserror::Error;

use crate::domain::Actor;
use crate::models::asset::Asset;
use crate::models::directory_user::{
    DirectoryUser, DirectoryUserFilter, DirectoryUserInput, DirectoryUserPatch,
};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory user not found: {0}")]
    NotFound(i32),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Directory integration is not enabled")]
    Disabled,

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for DirectoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DirectoryError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::Conflict(crate::db::UNIQUE_CONFLICT.to_string());
        }
        Self::Internal(err.to_string())
    }
}

/// Outcome counts of one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: u32,
    pub updated: u32,
    pub deactivated: u32,
    pub unchanged: u32,
    /// Entries that could not be stored (invalid or clashing identifiers).
    pub skipped: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryStatus {
    pub enabled: bool,
    pub kind: Option<String>,
    pub allow_directory_login: bool,
    pub last_synced_at: Option<String>,
    pub ldap_users: usize,
    pub manual_users: usize,
    pub active_users: usize,
}

#[async_trait::async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list(&self, filter: &DirectoryUserFilter) -> Result<Vec<DirectoryUser>, DirectoryError>;

    async fn get(&self, id: i32) -> Result<DirectoryUser, DirectoryError>;

    /// Assets currently assigned to the user.
    async fn assets(&self, id: i32) -> Result<Vec<Asset>, DirectoryError>;

    async fn create(
        &self,
        input: DirectoryUserInput,
        actor: &Actor,
    ) -> Result<DirectoryUser, DirectoryError>;

    async fn update(
        &self,
        id: i32,
        patch: DirectoryUserPatch,
        actor: &Actor,
    ) -> Result<DirectoryUser, DirectoryError>;

    /// # Errors
    ///
    /// Returns [`DirectoryError::Conflict`] while the user still owns assets.
    async fn delete(&self, id: i32, actor: &Actor) -> Result<(), DirectoryError>;

    /// Pulls every entry from the configured directory and reconciles local records.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Disabled`] when no directory is configured and
    /// [`DirectoryError::Directory`] when the directory cannot be queried.
    async fn sync(&self, actor: &Actor) -> Result<SyncReport, DirectoryError>;

    async fn status(&self) -> Result<DirectoryStatus, DirectoryError>;
}
