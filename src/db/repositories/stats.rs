use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

use crate::entities::{assets, audit_logs, categories, directory_users};
use crate::models::asset::Asset;

#[derive(Debug, Clone, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category_id: Option<i32>,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Totals {
    pub assets: u64,
    pub categories: u64,
    pub directory_users: u64,
    pub active_directory_users: u64,
    pub audit_entries: u64,
    pub total_purchase_cost: f64,
}

/// Read-only aggregate queries behind the dashboard.
pub struct StatsRepository {
    conn: DatabaseConnection,
}

impl StatsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn totals(&self) -> Result<Totals> {
        let assets = assets::Entity::find().count(&self.conn).await?;
        let categories = categories::Entity::find().count(&self.conn).await?;
        let directory_users = directory_users::Entity::find().count(&self.conn).await?;
        let active_directory_users = directory_users::Entity::find()
            .filter(directory_users::Column::Active.eq(true))
            .count(&self.conn)
            .await?;
        let audit_entries = audit_logs::Entity::find().count(&self.conn).await?;

        let total_purchase_cost: Option<f64> = assets::Entity::find()
            .select_only()
            .column_as(assets::Column::PurchaseCost.sum(), "total")
            .into_tuple::<Option<f64>>()
            .one(&self.conn)
            .await
            .context("Failed to sum purchase costs")?
            .flatten();

        Ok(Totals {
            assets,
            categories,
            directory_users,
            active_directory_users,
            audit_entries,
            total_purchase_cost: total_purchase_cost.unwrap_or(0.0),
        })
    }

    pub async fn by_status(&self) -> Result<Vec<LabelCount>> {
        self.group_count(assets::Column::Status).await
    }

    pub async fn by_type(&self) -> Result<Vec<LabelCount>> {
        self.group_count(assets::Column::AssetType).await
    }

    async fn group_count(&self, column: assets::Column) -> Result<Vec<LabelCount>> {
        let rows: Vec<(String, i64)> = assets::Entity::find()
            .select_only()
            .column(column)
            .column_as(assets::Column::Id.count(), "count")
            .group_by(column)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group asset counts")?;

        Ok(rows
            .into_iter()
            .map(|(label, count)| LabelCount {
                label,
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect())
    }

    /// Asset counts per category, with uncategorized assets reported under `category_id = None`.
    pub async fn by_category(&self) -> Result<Vec<CategoryCount>> {
        let rows: Vec<(Option<i32>, i64)> = assets::Entity::find()
            .select_only()
            .column(assets::Column::CategoryId)
            .column_as(assets::Column::Id.count(), "count")
            .group_by(assets::Column::CategoryId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count assets per category")?;

        let names: std::collections::HashMap<i32, String> = categories::Entity::find()
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut counts: Vec<CategoryCount> = rows
            .into_iter()
            .map(|(category_id, count)| CategoryCount {
                category_id,
                name: category_id
                    .and_then(|id| names.get(&id).cloned())
                    .unwrap_or_else(|| "Uncategorized".to_string()),
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect();

        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(counts)
    }

    /// Assets whose warranty ends between `from` and `until` (inclusive, `YYYY-MM-DD`),
    /// soonest first. Retired and lost assets are left out.
    pub async fn warranties_expiring(&self, from: &str, until: &str) -> Result<Vec<Asset>> {
        let rows = assets::Entity::find()
            .filter(assets::Column::WarrantyExpires.gte(from))
            .filter(assets::Column::WarrantyExpires.lte(until))
            .filter(assets::Column::Status.is_not_in(["retired", "lost"]))
            .order_by_asc(assets::Column::WarrantyExpires)
            .all(&self.conn)
            .await
            .context("Failed to query expiring warranties")?;

        Ok(rows.into_iter().map(Asset::from).collect())
    }
}
