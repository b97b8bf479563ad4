//! `SeaORM` implementation of the `CategoryService` trait.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::db::Store;
use crate::domain::{Actor, AuditAction, EntityType};
use crate::models::category::{
    Category, CategoryFields, CategoryInput, CategoryNode, CategoryPatch, CategorySummary,
    build_tree,
};
use crate::services::audit::AuditService;
use crate::services::category_service::{CategoryError, CategoryService};

pub struct SeaOrmCategoryService {
    store: Store,
    audit: AuditService,
}

impl SeaOrmCategoryService {
    #[must_use]
    pub const fn new(store: Store, audit: AuditService) -> Self {
        Self { store, audit }
    }

    async fn validate(&self, fields: &CategoryFields, id: Option<i32>) -> Result<(), CategoryError> {
        if self.store.categories().name_taken(&fields.name, id).await? {
            return Err(CategoryError::Conflict(format!(
                "Category '{}' already exists",
                fields.name
            )));
        }

        let Some(parent_id) = fields.parent_id else {
            return Ok(());
        };

        let links = self.store.categories().parent_links().await?;
        if !links.contains_key(&parent_id) {
            return Err(CategoryError::ParentNotFound(parent_id));
        }

        if let Some(id) = id {
            if creates_cycle(&links, id, parent_id) {
                return Err(CategoryError::Validation(
                    "A category cannot be moved under itself or one of its descendants"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Whether making `parent_id` the parent of `id` would close a loop.
fn creates_cycle(links: &HashMap<i32, Option<i32>>, id: i32, parent_id: i32) -> bool {
    let mut cursor = Some(parent_id);
    let mut steps = 0usize;

    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        // Stored links may already contain a loop.
        steps += 1;
        if steps > links.len() {
            return true;
        }
        cursor = links.get(&current).copied().flatten();
    }

    false
}

#[async_trait]
impl CategoryService for SeaOrmCategoryService {
    async fn list(&self) -> Result<Vec<CategorySummary>, CategoryError> {
        let categories = self.store.categories().list().await?;
        let counts = self.store.categories().asset_counts().await?;

        Ok(categories
            .into_iter()
            .map(|category| {
                let asset_count = counts.get(&category.id).copied().unwrap_or(0);
                CategorySummary {
                    category,
                    asset_count,
                }
            })
            .collect())
    }

    async fn tree(&self) -> Result<Vec<CategoryNode>, CategoryError> {
        let summaries = self.list().await?;
        Ok(build_tree(&summaries))
    }

    async fn get(&self, id: i32) -> Result<Category, CategoryError> {
        self.store
            .categories()
            .get(id)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    async fn create(&self, input: CategoryInput, actor: &Actor) -> Result<Category, CategoryError> {
        let fields = input.normalize().map_err(CategoryError::Validation)?;
        self.validate(&fields, None).await?;

        let category = self.store.categories().create(&fields).await?;
        self.audit
            .record_create(EntityType::Category, category.id, actor, &category)
            .await?;

        info!(category_id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    async fn update(
        &self,
        id: i32,
        patch: CategoryPatch,
        actor: &Actor,
    ) -> Result<Category, CategoryError> {
        let current = self.get(id).await?;
        let fields = patch.apply(&current).map_err(CategoryError::Validation)?;
        self.validate(&fields, Some(id)).await?;

        let updated = self
            .store
            .categories()
            .update(id, &fields)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        self.audit
            .record_change(
                EntityType::Category,
                id,
                AuditAction::Update,
                actor,
                &current,
                &updated,
            )
            .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i32, actor: &Actor) -> Result<(), CategoryError> {
        let current = self.get(id).await?;

        let children = self.store.categories().child_count(id).await?;
        if children > 0 {
            return Err(CategoryError::Conflict(format!(
                "Category '{}' still has {children} subcategories",
                current.name
            )));
        }

        let assets = self.store.assets().count_for_category(id).await?;
        if assets > 0 {
            return Err(CategoryError::Conflict(format!(
                "Category '{}' still has {assets} assets",
                current.name
            )));
        }

        self.store.categories().delete(id).await?;
        self.audit
            .record_delete(EntityType::Category, id, actor, &current)
            .await?;

        info!(category_id = id, name = %current.name, "Category deleted");
        Ok(())
    }
}
