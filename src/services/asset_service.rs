//! Domain service for the asset inventory.
//!
//! Every mutation is followed by an audit entry written with the caller as actor.

use thiserror::Error;

use crate::domain::Actor;
use crate::models::Page;
use crate::models::asset::{Asset, AssetFields, AssetFilter, AssetInput, AssetPatch};
use crate::models::audit::AuditEntry;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(i32),

    #[error("Asset tag '{0}' is already in use")]
    DuplicateTag(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(i32),

    #[error("Directory user not found: {0}")]
    OwnerNotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AssetError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AssetError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait AssetService: Send + Sync {
    async fn list(
        &self,
        filter: &AssetFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Asset>, AssetError>;

    async fn get(&self, id: i32) -> Result<Asset, AssetError>;

    /// # Errors
    ///
    /// Returns [`AssetError::DuplicateTag`] if the tag already exists and
    /// [`AssetError::Validation`] for malformed fields.
    async fn create(&self, input: AssetInput, actor: &Actor) -> Result<Asset, AssetError>;

    /// Creates an asset from an import row. Audited as `import`.
    async fn create_imported(
        &self,
        fields: AssetFields,
        actor: &Actor,
    ) -> Result<Asset, AssetError>;

    /// Applies a partial update. No audit entry is written if nothing changed.
    async fn update(&self, id: i32, patch: AssetPatch, actor: &Actor) -> Result<Asset, AssetError>;

    async fn delete(&self, id: i32, actor: &Actor) -> Result<(), AssetError>;

    /// Sets (`Some`) or clears (`None`) the owning directory user.
    async fn assign(
        &self,
        id: i32,
        owner: Option<i32>,
        actor: &Actor,
    ) -> Result<Asset, AssetError>;

    async fn history(&self, id: i32) -> Result<Vec<AuditEntry>, AssetError>;

    /// CSV with category names and owner emails in place of ids.
    async fn export_csv(&self, filter: &AssetFilter) -> Result<String, AssetError>;
}
