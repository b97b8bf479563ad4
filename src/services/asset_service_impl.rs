//! `SeaORM` implementation of the `AssetService` trait.

use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::db::Store;
use crate::domain::{Actor, AuditAction, EntityType};
use crate::models::Page;
use crate::models::asset::{Asset, AssetFields, AssetFilter, AssetInput, AssetPatch};
use crate::models::audit::AuditEntry;
use crate::services::asset_service::{AssetError, AssetService};
use crate::services::audit::AuditService;

pub struct SeaOrmAssetService {
    store: Store,
    audit: AuditService,
}

impl SeaOrmAssetService {
    #[must_use]
    pub const fn new(store: Store, audit: AuditService) -> Self {
        Self { store, audit }
    }

    async fn load(&self, id: i32) -> Result<Asset, AssetError> {
        self.store
            .assets()
            .get(id)
            .await?
            .ok_or(AssetError::NotFound(id))
    }

    /// Checks uniqueness and that referenced rows exist.
    async fn check_references(
        &self,
        fields: &AssetFields,
        except_id: Option<i32>,
        previous_owner: Option<i32>,
    ) -> Result<(), AssetError> {
        if self
            .store
            .assets()
            .tag_taken(&fields.asset_tag, except_id)
            .await?
        {
            return Err(AssetError::DuplicateTag(fields.asset_tag.clone()));
        }

        if let Some(category_id) = fields.category_id {
            if self.store.categories().get(category_id).await?.is_none() {
                return Err(AssetError::CategoryNotFound(category_id));
            }
        }

        if let Some(owner_id) = fields.assigned_to {
            let owner = self
                .store
                .directory_users()
                .get(owner_id)
                .await?
                .ok_or(AssetError::OwnerNotFound(owner_id))?;

            if !owner.active && previous_owner != Some(owner_id) {
                return Err(AssetError::Validation(format!(
                    "Directory user '{}' is inactive and cannot receive assets",
                    owner.email
                )));
            }
        }

        Ok(())
    }

    async fn insert(
        &self,
        fields: AssetFields,
        action: AuditAction,
        actor: &Actor,
    ) -> Result<Asset, AssetError> {
        self.check_references(&fields, None, None).await?;

        let asset = self
            .store
            .assets()
            .create(&fields)
            .await
            .map_err(|e| duplicate_tag_or(e, &fields.asset_tag))?;

        let snapshot = crate::domain::audit::snapshot(&asset)?;
        self.audit
            .record(EntityType::Asset, asset.id, action, actor, None, Some(snapshot))
            .await?;

        info!(asset_id = asset.id, tag = %asset.asset_tag, actor = %actor.name, "Asset created");
        Ok(asset)
    }

    async fn store_update(
        &self,
        current: &Asset,
        fields: AssetFields,
        action: AuditAction,
        actor: &Actor,
    ) -> Result<Asset, AssetError> {
        self.check_references(&fields, Some(current.id), current.assigned_to)
            .await?;

        let updated = self
            .store
            .assets()
            .update(current.id, &fields)
            .await
            .map_err(|e| duplicate_tag_or(e, &fields.asset_tag))?
            .ok_or(AssetError::NotFound(current.id))?;

        self.audit
            .record_change(EntityType::Asset, current.id, action, actor, current, &updated)
            .await?;

        Ok(updated)
    }
}

#[async_trait]
impl AssetService for SeaOrmAssetService {
    async fn list(
        &self,
        filter: &AssetFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Asset>, AssetError> {
        let (items, total) = self.store.assets().list(filter, page, page_size).await?;
        Ok(Page::new(items, total, page, page_size))
    }

    async fn get(&self, id: i32) -> Result<Asset, AssetError> {
        self.load(id).await
    }

    async fn create(&self, input: AssetInput, actor: &Actor) -> Result<Asset, AssetError> {
        let fields = input.normalize().map_err(AssetError::Validation)?;
        self.insert(fields, AuditAction::Create, actor).await
    }

    async fn create_imported(
        &self,
        fields: AssetFields,
        actor: &Actor,
    ) -> Result<Asset, AssetError> {
        self.insert(fields, AuditAction::Import, actor).await
    }

    async fn update(&self, id: i32, patch: AssetPatch, actor: &Actor) -> Result<Asset, AssetError> {
        let current = self.load(id).await?;
        let fields = patch.apply(&current).map_err(AssetError::Validation)?;

        self.store_update(&current, fields, AuditAction::Update, actor)
            .await
    }

    async fn delete(&self, id: i32, actor: &Actor) -> Result<(), AssetError> {
        let current = self.load(id).await?;

        if !self.store.assets().delete(id).await? {
            return Err(AssetError::NotFound(id));
        }

        self.audit
            .record_delete(EntityType::Asset, id, actor, &current)
            .await?;

        info!(asset_id = id, tag = %current.asset_tag, actor = %actor.name, "Asset deleted");
        Ok(())
    }

    async fn assign(
        &self,
        id: i32,
        owner: Option<i32>,
        actor: &Actor,
    ) -> Result<Asset, AssetError> {
        let current = self.load(id).await?;

        if current.assigned_to == owner {
            return Ok(current);
        }

        let fields = AssetFields::with_owner(&current, owner).map_err(AssetError::Validation)?;
        let action = if owner.is_some() {
            AuditAction::Assign
        } else {
            AuditAction::Unassign
        };

        let updated = self.store_update(&current, fields, action, actor).await?;

        info!(
            asset_id = id,
            owner = ?owner,
            actor = %actor.name,
            "Asset ownership changed"
        );
        Ok(updated)
    }

    async fn history(&self, id: i32) -> Result<Vec<AuditEntry>, AssetError> {
        // History outlives the asset, so a deleted id is not an error here.
        Ok(self.audit.history(EntityType::Asset, id).await?)
    }

    async fn export_csv(&self, filter: &AssetFilter) -> Result<String, AssetError> {
        let assets = self.store.assets().list_all(filter).await?;

        let categories: HashMap<i32, String> = self
            .store
            .categories()
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let owners: HashMap<i32, String> = self
            .store
            .directory_users()
            .list(&Default::default())
            .await?
            .into_iter()
            .map(|u| (u.id, u.email))
            .collect();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "asset_tag",
                "name",
                "asset_type",
                "status",
                "category",
                "assigned_to",
                "serial_number",
                "manufacturer",
                "model",
                "location",
                "purchase_date",
                "purchase_cost",
                "warranty_expires",
                "notes",
            ])
            .context("Failed to write CSV header")?;

        for asset in assets {
            let category = asset
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .unwrap_or_default();
            let owner = asset
                .assigned_to
                .and_then(|id| owners.get(&id).cloned())
                .unwrap_or_default();

            writer
                .write_record([
                    asset.asset_tag,
                    asset.name,
                    asset.asset_type.to_string(),
                    asset.status.to_string(),
                    category,
                    owner,
                    asset.serial_number.unwrap_or_default(),
                    asset.manufacturer.unwrap_or_default(),
                    asset.model.unwrap_or_default(),
                    asset.location.unwrap_or_default(),
                    asset.purchase_date.unwrap_or_default(),
                    asset
                        .purchase_cost
                        .map(|c| format!("{c:.2}"))
                        .unwrap_or_default(),
                    asset.warranty_expires.unwrap_or_default(),
                    asset.notes.unwrap_or_default(),
                ])
                .context("Failed to write CSV row")?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
        Ok(String::from_utf8(bytes).context("Asset CSV was not valid UTF-8")?)
    }
}

/// A write that lost a race on the tag index is still a duplicate tag.
fn duplicate_tag_or(err: anyhow::Error, tag: &str) -> AssetError {
    if crate::db::is_unique_violation(&err) {
        AssetError::DuplicateTag(tag.to_string())
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tag_index_rejection_is_a_duplicate_tag() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let fields = AssetInput {
            asset_tag: "lt-1".to_string(),
            name: "Laptop".to_string(),
            ..AssetInput::default()
        }
        .normalize()
        .unwrap();

        // Skips the service's own pre-check, like a concurrent writer would.
        store.assets().create(&fields).await.unwrap();
        let err = store.assets().create(&fields).await.unwrap_err();

        assert!(matches!(
            duplicate_tag_or(err, &fields.asset_tag),
            AssetError::DuplicateTag(tag) if tag == "LT-1"
        ));
        assert!(matches!(
            duplicate_tag_or(anyhow::anyhow!("disk full"), "LT-1"),
            AssetError::Internal(_)
        ));
    }
}
