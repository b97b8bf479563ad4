use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set,
};

use crate::entities::assets;
use crate::models::asset::{Asset, AssetFields, AssetFilter};
use crate::models::now_rfc3339;

pub struct AssetRepository {
    conn: DatabaseConnection,
}

impl AssetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn filtered(filter: &AssetFilter) -> Select<assets::Entity> {
        let mut query = assets::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(assets::Column::Status.eq(status.as_str()));
        }

        if let Some(asset_type) = filter.asset_type {
            query = query.filter(assets::Column::AssetType.eq(asset_type.as_str()));
        }

        if let Some(category_id) = filter.category_id {
            query = query.filter(assets::Column::CategoryId.eq(category_id));
        }

        if let Some(owner) = filter.assigned_to {
            query = query.filter(assets::Column::AssignedTo.eq(owner));
        }

        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(assets::Column::AssetTag.contains(q.to_uppercase()))
                    .add(assets::Column::Name.contains(q))
                    .add(assets::Column::SerialNumber.contains(q)),
            );
        }

        query
    }

    /// Returns one page (1-based) and the total number of matches.
    pub async fn list(
        &self,
        filter: &AssetFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Asset>, u64)> {
        let paginator = Self::filtered(filter)
            .order_by_asc(assets::Column::AssetTag)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to list assets")?;

        Ok((items.into_iter().map(Asset::from).collect(), total))
    }

    pub async fn list_all(&self, filter: &AssetFilter) -> Result<Vec<Asset>> {
        let rows = Self::filtered(filter)
            .order_by_asc(assets::Column::AssetTag)
            .all(&self.conn)
            .await
            .context("Failed to list assets")?;

        Ok(rows.into_iter().map(Asset::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Asset>> {
        let row = assets::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query asset")?;

        Ok(row.map(Asset::from))
    }

    pub async fn tag_taken(&self, tag: &str, except_id: Option<i32>) -> Result<bool> {
        let row = assets::Entity::find()
            .filter(assets::Column::AssetTag.eq(tag))
            .one(&self.conn)
            .await?;

        Ok(row.is_some_and(|r| Some(r.id) != except_id))
    }

    pub async fn create(&self, fields: &AssetFields) -> Result<Asset> {
        let now = now_rfc3339();
        let mut active = assets::ActiveModel {
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_fields(&mut active, fields);

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert asset")?;

        Ok(Asset::from(model))
    }

    pub async fn update(&self, id: i32, fields: &AssetFields) -> Result<Option<Asset>> {
        let Some(row) = assets::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: assets::ActiveModel = row.into();
        apply_fields(&mut active, fields);
        active.updated_at = Set(now_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update asset")?;

        Ok(Some(Asset::from(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = assets::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete asset")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_for_owner(&self, owner: i32) -> Result<u64> {
        let count = assets::Entity::find()
            .filter(assets::Column::AssignedTo.eq(owner))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    pub async fn count_for_category(&self, category_id: i32) -> Result<u64> {
        let count = assets::Entity::find()
            .filter(assets::Column::CategoryId.eq(category_id))
            .count(&self.conn)
            .await?;

        Ok(count)
    }
}

fn apply_fields(active: &mut assets::ActiveModel, fields: &AssetFields) {
    active.asset_tag = Set(fields.asset_tag.clone());
    active.name = Set(fields.name.clone());
    active.asset_type = Set(fields.asset_type.as_str().to_string());
    active.status = Set(fields.status.as_str().to_string());
    active.category_id = Set(fields.category_id);
    active.assigned_to = Set(fields.assigned_to);
    active.serial_number = Set(fields.serial_number.clone());
    active.manufacturer = Set(fields.manufacturer.clone());
    active.model = Set(fields.model.clone());
    active.location = Set(fields.location.clone());
    active.notes = Set(fields.notes.clone());
    active.purchase_date = Set(fields.purchase_date.clone());
    active.purchase_cost = Set(fields.purchase_cost);
    active.warranty_expires = Set(fields.warranty_expires.clone());
}
