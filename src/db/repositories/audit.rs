use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

use crate::entities::audit_logs;
use crate::models::audit::{AuditEntry, AuditFilter, NewAuditEntry};
use crate::models::now_rfc3339;

/// Append-only access to `audit_logs`.
pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
        let encode = |value: Option<serde_json::Value>| -> Result<Option<String>> {
            value
                .map(|v| serde_json::to_string(&v))
                .transpose()
                .context("Failed to encode audit payload")
        };

        let active = audit_logs::ActiveModel {
            entity_type: Set(entry.entity_type.as_str().to_string()),
            entity_id: Set(entry.entity_id),
            action: Set(entry.action.as_str().to_string()),
            actor_id: Set(entry.actor_id),
            actor: Set(entry.actor),
            old_values: Set(encode(entry.old_values)?),
            new_values: Set(encode(entry.new_values)?),
            changes: Set(encode(entry.changes)?),
            created_at: Set(now_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to write audit entry")?;

        Ok(AuditEntry::from(model))
    }

    fn filtered(filter: &AuditFilter) -> Select<audit_logs::Entity> {
        let mut query = audit_logs::Entity::find()
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id);

        if let Some(entity_type) = filter.entity_type.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_logs::Column::EntityType.eq(entity_type));
        }

        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit_logs::Column::EntityId.eq(entity_id));
        }

        if let Some(action) = filter.action.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_logs::Column::Action.eq(action));
        }

        if let Some(actor) = filter.actor.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_logs::Column::Actor.contains(actor));
        }

        if let Some(from) = filter.from.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_logs::Column::CreatedAt.gte(lower_bound(from)));
        }

        if let Some(to) = filter.to.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(audit_logs::Column::CreatedAt.lte(upper_bound(to)));
        }

        query
    }

    pub async fn list(
        &self,
        filter: &AuditFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<AuditEntry>, u64)> {
        let paginator = Self::filtered(filter).paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to list audit entries")?;

        Ok((items.into_iter().map(AuditEntry::from).collect(), total))
    }

    pub async fn list_all(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        let rows = Self::filtered(filter).all(&self.conn).await?;
        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<AuditEntry>> {
        let row = audit_logs::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(AuditEntry::from))
    }

    pub async fn for_entity(&self, entity_type: &str, entity_id: i32) -> Result<Vec<AuditEntry>> {
        let filter = AuditFilter {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id),
            ..AuditFilter::default()
        };
        self.list_all(&filter).await
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<AuditEntry>> {
        let rows = Self::filtered(&AuditFilter::default())
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(audit_logs::Entity::find().count(&self.conn).await?)
    }
}

/// A bare date widens to the start of that day.
fn lower_bound(value: &str) -> String {
    if value.len() == 10 {
        format!("{value}T00:00:00")
    } else {
        to_stored_utc(value)
    }
}

/// A bare date widens to the end of that day.
fn upper_bound(value: &str) -> String {
    if value.len() == 10 {
        format!("{value}T99:99:99")
    } else {
        to_stored_utc(value)
    }
}

/// Stored timestamps are UTC, so offsets have to be folded in before the
/// string comparison.
fn to_stored_utc(value: &str) -> String {
    DateTime::parse_from_rfc3339(value).map_or_else(
        |_| value.to_string(),
        |stamp| stamp.with_timezone(&Utc).to_rfc3339(),
    )
}
