//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::directory::{DirectoryClient, derive_role};
use crate::config::{DirectoryConfig, SecurityConfig};
use crate::db::Store;
use crate::domain::{Actor, AuditAction, AuthSource, EntityType, Role};
use crate::models::directory_user::normalize_email;
use crate::models::user::{NewUser, User};
use crate::services::audit::AuditService;
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    audit: AuditService,
    security: SecurityConfig,
    directory: DirectoryConfig,
    client: Option<Arc<dyn DirectoryClient>>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        audit: AuditService,
        security: SecurityConfig,
        directory: DirectoryConfig,
        client: Option<Arc<dyn DirectoryClient>>,
    ) -> Self {
        Self {
            store,
            audit,
            security,
            directory,
            client,
        }
    }

    fn directory_login(&self) -> Option<&Arc<dyn DirectoryClient>> {
        self.client
            .as_ref()
            .filter(|_| self.directory.allow_directory_login)
    }

    /// Directory-backed accounts lose access once their directory record is deactivated.
    async fn is_enabled(&self, user: &User) -> Result<bool, AuthError> {
        if user.auth_source != AuthSource::Directory {
            return Ok(true);
        }

        let record = self.store.directory_users().get_by_email(&user.email).await?;
        Ok(record.is_none_or(|r| r.active))
    }

    async fn login_with_directory(
        &self,
        client: &Arc<dyn DirectoryClient>,
        email: &str,
        password: &str,
        existing: Option<User>,
    ) -> Result<User, AuthError> {
        let entry = client
            .authenticate(email, password)
            .await
            .map_err(|e| AuthError::Directory(format!("{e:#}")))?
            .ok_or(AuthError::InvalidCredentials)?;

        let role = derive_role(&entry.groups, &self.directory);
        let users = self.store.users();

        let user = match existing {
            Some(before) => {
                let after = users
                    .sync_directory_account(before.id, &entry.display_name, role)
                    .await?;
                self.audit
                    .record_change(
                        EntityType::User,
                        after.id,
                        AuditAction::Update,
                        &Actor::system("directory-login"),
                        &before,
                        &after,
                    )
                    .await?;
                if before.role != after.role {
                    info!(user_id = after.id, from = %before.role, to = %after.role, "Directory account role changed at login");
                }
                after
            }
            None => {
                let user = users
                    .create(
                        email,
                        &entry.display_name,
                        None,
                        role,
                        AuthSource::Directory,
                        &self.security,
                    )
                    .await?;
                self.audit
                    .record_create(
                        EntityType::User,
                        user.id,
                        &Actor::system("directory-login"),
                        &user,
                    )
                    .await?;
                info!(user_id = user.id, email = %user.email, role = %role, "Directory account provisioned");
                user
            }
        };

        if !self.is_enabled(&user).await? {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    fn validate_new_password(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let users = self.store.users();
        let existing = users.get_by_email(&email).await?;

        let result = match existing {
            Some(user) if user.auth_source == AuthSource::Local => {
                if users.verify_password(&email, password).await? {
                    Ok(user)
                } else {
                    Err(AuthError::InvalidCredentials)
                }
            }
            existing => match self.directory_login() {
                Some(client) => {
                    self.login_with_directory(client, &email, password, existing)
                        .await
                }
                None => Err(AuthError::InvalidCredentials),
            },
        };

        match &result {
            Ok(user) => {
                metrics::counter!("assetdesk_logins_total", "outcome" => "success").increment(1);
                info!(user_id = user.id, email = %user.email, source = user.auth_source.as_str(), "User logged in");
            }
            Err(e) => {
                metrics::counter!("assetdesk_logins_total", "outcome" => "failure").increment(1);
                warn!(email = %email, error = %e, "Login failed");
            }
        }

        result
    }

    async fn resolve_session(&self, user_id: i32) -> Result<Option<User>, AuthError> {
        let Some(user) = self.store.users().get_by_id(user_id).await? else {
            return Ok(None);
        };

        Ok(self.is_enabled(&user).await?.then_some(user))
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        let Some(user) = self.store.users().verify_api_key(api_key).await? else {
            return Ok(None);
        };

        Ok(self.is_enabled(&user).await?.then_some(user))
    }

    async fn get_user(&self, id: i32) -> Result<User, AuthError> {
        self.store
            .users()
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn change_password(
        &self,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.get_user(id).await?;

        if user.auth_source == AuthSource::Directory {
            return Err(AuthError::Validation(
                "Directory accounts change their password in the directory".to_string(),
            ));
        }

        self.validate_new_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let users = self.store.users();
        if !users.verify_password(&user.email, current_password).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        users.update_password(id, new_password, &self.security).await?;
        info!(user_id = id, "Password changed");

        Ok(())
    }

    async fn get_api_key(&self, id: i32) -> Result<String, AuthError> {
        Ok(self.get_user(id).await?.api_key)
    }

    async fn regenerate_api_key(&self, id: i32) -> Result<String, AuthError> {
        self.get_user(id).await?;
        let key = self.store.users().regenerate_api_key(id).await?;
        info!(user_id = id, "API key regenerated");
        Ok(key)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.users().list().await?)
    }

    async fn create_user(&self, input: NewUser, actor: &Actor) -> Result<User, AuthError> {
        let email = normalize_email(&input.email).map_err(AuthError::Validation)?;
        self.validate_new_password(&input.password)?;

        let display_name = input
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.clone());

        let users = self.store.users();
        if users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict(format!("User '{email}' already exists")));
        }

        let user = users
            .create(
                &email,
                &display_name,
                Some(&input.password),
                input.role,
                AuthSource::Local,
                &self.security,
            )
            .await?;

        self.audit
            .record_create(EntityType::User, user.id, actor, &user)
            .await?;

        info!(user_id = user.id, email = %user.email, role = %user.role, "User created");
        Ok(user)
    }

    async fn update_role(&self, id: i32, role: Role, actor: &Actor) -> Result<User, AuthError> {
        let current = self.get_user(id).await?;

        if actor.id == Some(id) && role != current.role {
            return Err(AuthError::Forbidden(
                "You cannot change your own role".to_string(),
            ));
        }

        let updated = self
            .store
            .users()
            .update_role(id, role)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.audit
            .record_change(
                EntityType::User,
                id,
                AuditAction::Update,
                actor,
                &current,
                &updated,
            )
            .await?;

        Ok(updated)
    }

    async fn delete_user(&self, id: i32, actor: &Actor) -> Result<(), AuthError> {
        if actor.id == Some(id) {
            return Err(AuthError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }

        let current = self.get_user(id).await?;
        self.store.users().delete(id).await?;

        self.audit
            .record_delete(EntityType::User, id, actor, &current)
            .await?;

        info!(user_id = id, email = %current.email, "User deleted");
        Ok(())
    }
}
