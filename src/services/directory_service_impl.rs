//! `SeaORM` implementation of the `DirectoryService` trait.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::clients::directory::{DirectoryClient, DirectoryEntry, derive_role};
use crate::config::DirectoryConfig;
use crate::db::Store;
use crate::domain::{Actor, AuditAction, AuthSource, DirectorySource, EntityType};
use crate::models::asset::{Asset, AssetFilter};
use crate::models::directory_user::{
    DirectoryUser, DirectoryUserFields, DirectoryUserFilter, DirectoryUserInput,
    DirectoryUserPatch, normalize_email, normalize_employee_id,
};
use crate::models::{clean_text, now_rfc3339};
use crate::services::audit::AuditService;
use crate::services::directory_service::{
    DirectoryError, DirectoryService, DirectoryStatus, SyncReport,
};

pub struct SeaOrmDirectoryService {
    store: Store,
    audit: AuditService,
    config: DirectoryConfig,
    client: Option<Arc<dyn DirectoryClient>>,
}

impl SeaOrmDirectoryService {
    #[must_use]
    pub fn new(
        store: Store,
        audit: AuditService,
        config: DirectoryConfig,
        client: Option<Arc<dyn DirectoryClient>>,
    ) -> Self {
        Self {
            store,
            audit,
            config,
            client,
        }
    }

    async fn ensure_unique(
        &self,
        fields: &DirectoryUserFields,
        except_id: Option<i32>,
    ) -> Result<(), DirectoryError> {
        let conflict = self
            .store
            .directory_users()
            .find_conflict(&fields.employee_id, &fields.email, except_id)
            .await?;

        match conflict {
            Some(existing) if existing.employee_id == fields.employee_id => {
                Err(DirectoryError::Conflict(format!(
                    "Employee ID '{}' is already in use",
                    fields.employee_id
                )))
            }
            Some(_) => Err(DirectoryError::Conflict(format!(
                "Email '{}' is already in use",
                fields.email
            ))),
            None => Ok(()),
        }
    }

    /// Turns a directory entry into the record fields it should produce.
    fn fields_from_entry(&self, entry: &DirectoryEntry) -> Result<DirectoryUserFields, String> {
        let employee_id = normalize_employee_id(&entry.employee_id)?;
        let email = normalize_email(&entry.email)?;
        let display_name = clean_text(Some(entry.display_name.clone())).unwrap_or_else(|| email.clone());

        Ok(DirectoryUserFields {
            employee_id,
            email,
            display_name,
            department: clean_text(entry.department.clone()),
            title: clean_text(entry.title.clone()),
            phone: clean_text(entry.phone.clone()),
            manager: clean_text(entry.manager.clone()),
            distinguished_name: clean_text(entry.distinguished_name.clone()),
            source: DirectorySource::Ldap,
            role: derive_role(&entry.groups, &self.config),
            active: !entry.disabled,
        })
    }

    async fn audit_sync(
        &self,
        actor: &Actor,
        before: Option<&DirectoryUser>,
        after: &DirectoryUser,
    ) -> Result<(), DirectoryError> {
        let old = before.map(crate::domain::audit::snapshot).transpose()?;
        let new = crate::domain::audit::snapshot(after)?;

        self.audit
            .record(
                EntityType::DirectoryUser,
                after.id,
                AuditAction::Sync,
                actor,
                old,
                Some(new),
            )
            .await?;

        Ok(())
    }

    /// Gives a directory-backed login account the role derived for its record.
    async fn align_login_account(
        &self,
        record: &DirectoryUser,
        actor: &Actor,
    ) -> Result<(), DirectoryError> {
        let users = self.store.users();
        let Some(account) = users.get_by_email(&record.email).await? else {
            return Ok(());
        };
        if account.auth_source != AuthSource::Directory || account.role == record.role {
            return Ok(());
        }

        let Some(updated) = users.update_role(account.id, record.role).await? else {
            return Ok(());
        };
        self.audit
            .record_change(
                EntityType::User,
                updated.id,
                AuditAction::Update,
                actor,
                &account,
                &updated,
            )
            .await?;

        info!(
            user_id = updated.id,
            from = %account.role,
            to = %updated.role,
            "Directory account role updated by sync"
        );
        Ok(())
    }
}

#[async_trait]
impl DirectoryService for SeaOrmDirectoryService {
    async fn list(&self, filter: &DirectoryUserFilter) -> Result<Vec<DirectoryUser>, DirectoryError> {
        Ok(self.store.directory_users().list(filter).await?)
    }

    async fn get(&self, id: i32) -> Result<DirectoryUser, DirectoryError> {
        self.store
            .directory_users()
            .get(id)
            .await?
            .ok_or(DirectoryError::NotFound(id))
    }

    async fn assets(&self, id: i32) -> Result<Vec<Asset>, DirectoryError> {
        self.get(id).await?;

        let filter = AssetFilter {
            assigned_to: Some(id),
            ..AssetFilter::default()
        };
        Ok(self.store.assets().list_all(&filter).await?)
    }

    async fn create(
        &self,
        input: DirectoryUserInput,
        actor: &Actor,
    ) -> Result<DirectoryUser, DirectoryError> {
        let fields = input.normalize().map_err(DirectoryError::Validation)?;
        self.ensure_unique(&fields, None).await?;

        let user = self.store.directory_users().create(&fields, None).await?;
        self.audit
            .record_create(EntityType::DirectoryUser, user.id, actor, &user)
            .await?;

        info!(directory_user_id = user.id, email = %user.email, "Directory user created");
        Ok(user)
    }

    async fn update(
        &self,
        id: i32,
        patch: DirectoryUserPatch,
        actor: &Actor,
    ) -> Result<DirectoryUser, DirectoryError> {
        let current = self.get(id).await?;
        let fields = patch.apply(&current).map_err(DirectoryError::Validation)?;
        self.ensure_unique(&fields, Some(id)).await?;

        let updated = self
            .store
            .directory_users()
            .update(id, &fields, None)
            .await?
            .ok_or(DirectoryError::NotFound(id))?;

        self.audit
            .record_change(
                EntityType::DirectoryUser,
                id,
                AuditAction::Update,
                actor,
                &current,
                &updated,
            )
            .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i32, actor: &Actor) -> Result<(), DirectoryError> {
        let current = self.get(id).await?;

        let owned = self.store.assets().count_for_owner(id).await?;
        if owned > 0 {
            return Err(DirectoryError::Conflict(format!(
                "{} still has {owned} assigned assets",
                current.display_name
            )));
        }

        self.store.directory_users().delete(id).await?;
        self.audit
            .record_delete(EntityType::DirectoryUser, id, actor, &current)
            .await?;

        info!(directory_user_id = id, email = %current.email, "Directory user deleted");
        Ok(())
    }

    async fn sync(&self, actor: &Actor) -> Result<SyncReport, DirectoryError> {
        let client = self.client.as_ref().ok_or(DirectoryError::Disabled)?;
        let started = Instant::now();

        info!(kind = client.kind().as_str(), "Directory sync started");

        let entries = client
            .fetch_users()
            .await
            .map_err(|e| DirectoryError::Directory(format!("{e:#}")))?;

        let synced_at = now_rfc3339();
        let repo = self.store.directory_users();
        let existing = repo.list(&DirectoryUserFilter::default()).await?;

        let mut by_employee: HashMap<String, DirectoryUser> = HashMap::new();
        let mut by_email: HashMap<String, i32> = HashMap::new();
        for user in existing {
            by_email.insert(user.email.clone(), user.id);
            by_employee.insert(user.employee_id.clone(), user);
        }

        let mut report = SyncReport::default();
        let mut seen: HashSet<i32> = HashSet::new();

        for entry in &entries {
            let fields = match self.fields_from_entry(entry) {
                Ok(fields) => fields,
                Err(reason) => {
                    warn!(employee_id = %entry.employee_id, %reason, "Skipping directory entry");
                    report.skipped += 1;
                    continue;
                }
            };

            let matched = by_employee.get(&fields.employee_id).cloned().or_else(|| {
                by_email.get(&fields.email).and_then(|id| {
                    by_employee.values().find(|u| u.id == *id).cloned()
                })
            });

            if let Some(user) = &matched {
                if !seen.insert(user.id) {
                    warn!(employee_id = %fields.employee_id, "Duplicate directory entry skipped");
                    report.skipped += 1;
                    continue;
                }
            }

            match matched {
                Some(user) if DirectoryUserFields::from_user(&user) == fields => {
                    repo.touch_synced(user.id, &synced_at).await?;
                    self.align_login_account(&user, actor).await?;
                    report.unchanged += 1;
                }
                Some(user) => {
                    if self.ensure_unique(&fields, Some(user.id)).await.is_err() {
                        warn!(email = %fields.email, "Directory entry clashes with another record");
                        report.skipped += 1;
                        continue;
                    }

                    let updated = repo
                        .update(user.id, &fields, Some(synced_at.clone()))
                        .await?
                        .ok_or(DirectoryError::NotFound(user.id))?;
                    self.audit_sync(actor, Some(&user), &updated).await?;
                    self.align_login_account(&updated, actor).await?;

                    by_email.remove(&user.email);
                    by_email.insert(updated.email.clone(), updated.id);
                    by_employee.remove(&user.employee_id);
                    by_employee.insert(updated.employee_id.clone(), updated);
                    report.updated += 1;
                }
                None => {
                    if self.ensure_unique(&fields, None).await.is_err() {
                        warn!(email = %fields.email, "Directory entry clashes with another record");
                        report.skipped += 1;
                        continue;
                    }

                    let created = repo.create(&fields, Some(synced_at.clone())).await?;
                    self.audit_sync(actor, None, &created).await?;
                    self.align_login_account(&created, actor).await?;

                    seen.insert(created.id);
                    by_email.insert(created.email.clone(), created.id);
                    by_employee.insert(created.employee_id.clone(), created);
                    report.created += 1;
                }
            }
        }

        let absent: Vec<DirectoryUser> = by_employee
            .into_values()
            .filter(|u| u.source == DirectorySource::Ldap && u.active && !seen.contains(&u.id))
            .collect();

        for user in absent {
            let mut fields = DirectoryUserFields::from_user(&user);
            fields.active = false;

            let updated = repo
                .update(user.id, &fields, Some(synced_at.clone()))
                .await?
                .ok_or(DirectoryError::NotFound(user.id))?;
            self.audit_sync(actor, Some(&user), &updated).await?;
            report.deactivated += 1;
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            created = report.created,
            updated = report.updated,
            deactivated = report.deactivated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            duration_ms = report.duration_ms,
            "Directory sync finished"
        );
        metrics::counter!("assetdesk_directory_syncs_total").increment(1);

        Ok(report)
    }

    async fn status(&self) -> Result<DirectoryStatus, DirectoryError> {
        let repo = self.store.directory_users();
        let users = repo.list(&DirectoryUserFilter::default()).await?;

        Ok(DirectoryStatus {
            enabled: self.client.is_some(),
            kind: self.client.as_ref().map(|c| c.kind().as_str().to_string()),
            allow_directory_login: self.client.is_some() && self.config.allow_directory_login,
            last_synced_at: repo.last_synced_at().await?,
            ldap_users: users
                .iter()
                .filter(|u| u.source == DirectorySource::Ldap)
                .count(),
            manual_users: users
                .iter()
                .filter(|u| u.source == DirectorySource::Manual)
                .count(),
            active_users: users.iter().filter(|u| u.active).count(),
        })
    }
}
