use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::BTreeMap;

use crate::entities::import_templates;
use crate::models::import_template::ImportTemplate;
use crate::models::now_rfc3339;

pub struct ImportTemplateRepository {
    conn: DatabaseConnection,
}

impl ImportTemplateRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<ImportTemplate>> {
        let rows = import_templates::Entity::find()
            .order_by_asc(import_templates::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list import templates")?;

        Ok(rows.into_iter().map(ImportTemplate::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<ImportTemplate>> {
        let row = import_templates::Entity::find_by_id(id)
            .one(&self.conn)
            .await?;

        Ok(row.map(ImportTemplate::from))
    }

    pub async fn name_taken(&self, name: &str, except_id: Option<i32>) -> Result<bool> {
        let row = import_templates::Entity::find()
            .filter(import_templates::Column::Name.eq(name))
            .one(&self.conn)
            .await?;

        Ok(row.is_some_and(|r| Some(r.id) != except_id))
    }

    pub async fn create(
        &self,
        name: &str,
        mappings: &BTreeMap<String, String>,
        created_by: Option<&str>,
    ) -> Result<ImportTemplate> {
        let now = now_rfc3339();
        let active = import_templates::ActiveModel {
            name: Set(name.to_string()),
            mappings: Set(serde_json::to_string(mappings)?),
            created_by: Set(created_by.map(str::to_string)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert import template")?;

        Ok(ImportTemplate::from(model))
    }

    pub async fn update(
        &self,
        id: i32,
        name: &str,
        mappings: &BTreeMap<String, String>,
    ) -> Result<Option<ImportTemplate>> {
        let Some(row) = import_templates::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: import_templates::ActiveModel = row.into();
        active.name = Set(name.to_string());
        active.mappings = Set(serde_json::to_string(mappings)?);
        active.updated_at = Set(now_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(ImportTemplate::from(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = import_templates::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
