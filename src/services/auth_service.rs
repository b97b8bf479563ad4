//! Domain service for authentication and local account management.
//!
//! Handles login (local and directory-backed), password changes, API keys
//! and the admin-only user management operations.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Actor, Role};
use crate::models::user::{NewUser, User};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        if crate::db::is_unique_violation(&err) {
            return Self::Conflict(crate::db::UNIQUE_CONFLICT.to_string());
        }
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the account.
    ///
    /// Local accounts are checked against their Argon2 hash. Unknown or
    /// directory-backed accounts fall back to a directory bind when
    /// directory login is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Loads the account behind a session. `None` for deleted or disabled accounts.
    async fn resolve_session(&self, user_id: i32) -> Result<Option<User>, AuthError>;

    /// Verifies an API key and returns the associated account if valid.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError>;

    async fn get_user(&self, id: i32) -> Result<User, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect,
    /// the new one is too short, or the account is directory-backed.
    async fn change_password(
        &self,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_api_key(&self, id: i32) -> Result<String, AuthError>;

    /// Regenerates the API key for a user and returns the new one.
    async fn regenerate_api_key(&self, id: i32) -> Result<String, AuthError>;

    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    async fn create_user(&self, input: NewUser, actor: &Actor) -> Result<User, AuthError>;

    async fn update_role(&self, id: i32, role: Role, actor: &Actor) -> Result<User, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::Forbidden`] when an admin tries to delete their own account.
    async fn delete_user(&self, id: i32, actor: &Actor) -> Result<(), AuthError>;
}
