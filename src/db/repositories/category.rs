use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

use crate::entities::{assets, categories};
use crate::models::category::{Category, CategoryFields};
use crate::models::now_rfc3339;

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Category>> {
        let row = categories::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category")?;

        Ok(row.map(Category::from))
    }

    /// Case-insensitive lookup used by the importer.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        let needle = name.trim().to_lowercase();
        let rows = categories::Entity::find().all(&self.conn).await?;

        Ok(rows
            .into_iter()
            .find(|c| c.name.to_lowercase() == needle)
            .map(Category::from))
    }

    pub async fn name_taken(&self, name: &str, except_id: Option<i32>) -> Result<bool> {
        Ok(self
            .find_by_name(name)
            .await?
            .is_some_and(|c| Some(c.id) != except_id))
    }

    pub async fn create(&self, fields: &CategoryFields) -> Result<Category> {
        let now = now_rfc3339();
        let active = categories::ActiveModel {
            name: Set(fields.name.clone()),
            description: Set(fields.description.clone()),
            parent_id: Set(fields.parent_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert category")?;

        Ok(Category::from(model))
    }

    pub async fn update(&self, id: i32, fields: &CategoryFields) -> Result<Option<Category>> {
        let Some(row) = categories::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = row.into();
        active.name = Set(fields.name.clone());
        active.description = Set(fields.description.clone());
        active.parent_id = Set(fields.parent_id);
        active.updated_at = Set(now_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update category")?;

        Ok(Some(Category::from(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = categories::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete category")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn child_count(&self, id: i32) -> Result<u64> {
        let count = categories::Entity::find()
            .filter(categories::Column::ParentId.eq(id))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    /// `category_id -> number of assets` for every category that has at least one.
    pub async fn asset_counts(&self) -> Result<HashMap<i32, u64>> {
        let rows: Vec<(Option<i32>, i64)> = assets::Entity::find()
            .select_only()
            .column(assets::Column::CategoryId)
            .column_as(assets::Column::Id.count(), "count")
            .filter(assets::Column::CategoryId.is_not_null())
            .group_by(assets::Column::CategoryId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count assets per category")?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, count)| id.map(|id| (id, u64::try_from(count).unwrap_or(0))))
            .collect())
    }

    /// Parent links for every category, used for cycle detection.
    pub async fn parent_links(&self) -> Result<HashMap<i32, Option<i32>>> {
        let rows: Vec<(i32, Option<i32>)> = categories::Entity::find()
            .select_only()
            .column(categories::Column::Id)
            .column(categories::Column::ParentId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().collect())
    }
}
