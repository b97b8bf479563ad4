//! Domain service for the category hierarchy.

use thiserror::Error;

use crate::domain::Actor;
use crate::models::category::{Category, CategoryInput, CategoryNode, CategoryPatch, CategorySummary};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category not found: {0}")]
    NotFound(i32),

    #[error("Parent category not found: {0}")]
    ParentNotFound(i32),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CategoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CategoryError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::Conflict(crate::db::UNIQUE_CONFLICT.to_string());
        }
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait CategoryService: Send + Sync {
    /// Flat list, ordered by name, with direct asset counts.
    async fn list(&self) -> Result<Vec<CategorySummary>, CategoryError>;

    async fn tree(&self) -> Result<Vec<CategoryNode>, CategoryError>;

    async fn get(&self, id: i32) -> Result<Category, CategoryError>;

    async fn create(&self, input: CategoryInput, actor: &Actor) -> Result<Category, CategoryError>;

    /// # Errors
    ///
    /// Returns [`CategoryError::Validation`] if the new parent would create a cycle.
    async fn update(
        &self,
        id: i32,
        patch: CategoryPatch,
        actor: &Actor,
    ) -> Result<Category, CategoryError>;

    /// # Errors
    ///
    /// Returns [`CategoryError::Conflict`] while child categories or assets still reference it.
    async fn delete(&self, id: i32, actor: &Actor) -> Result<(), CategoryError>;
}
