//! Writes and queries the audit trail.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::db::Store;
use crate::domain::audit::{diff, snapshot};
use crate::domain::{Actor, AuditAction, EntityType};
use crate::models::Page;
use crate::models::audit::{AuditEntry, AuditFilter, NewAuditEntry};

/// Export format for audit exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("Unsupported export format: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct AuditService {
    store: Store,
}

impl AuditService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends one entry. Returns `None` without writing when an `update`
    /// carries no field changes.
    pub async fn record(
        &self,
        entity_type: EntityType,
        entity_id: i32,
        action: AuditAction,
        actor: &Actor,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) -> Result<Option<AuditEntry>> {
        let changes = diff(old_values.as_ref(), new_values.as_ref());

        if action == AuditAction::Update && changes.is_empty() {
            return Ok(None);
        }

        let entry = self
            .store
            .audit()
            .insert(NewAuditEntry {
                entity_type,
                entity_id,
                action,
                actor_id: actor.id,
                actor: actor.name.clone(),
                old_values,
                new_values,
                changes: (!changes.is_empty()).then_some(Value::Object(changes)),
            })
            .await?;

        tracing::debug!(
            entity_type = %entity_type,
            entity_id,
            action = %action,
            actor = %actor.name,
            "Audit entry recorded"
        );

        Ok(Some(entry))
    }

    pub async fn record_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: i32,
        actor: &Actor,
        record: &T,
    ) -> Result<()> {
        self.record(
            entity_type,
            entity_id,
            AuditAction::Create,
            actor,
            None,
            Some(snapshot(record)?),
        )
        .await?;
        Ok(())
    }

    pub async fn record_change<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: i32,
        action: AuditAction,
        actor: &Actor,
        before: &T,
        after: &T,
    ) -> Result<()> {
        self.record(
            entity_type,
            entity_id,
            action,
            actor,
            Some(snapshot(before)?),
            Some(snapshot(after)?),
        )
        .await?;
        Ok(())
    }

    pub async fn record_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: i32,
        actor: &Actor,
        record: &T,
    ) -> Result<()> {
        self.record(
            entity_type,
            entity_id,
            AuditAction::Delete,
            actor,
            Some(snapshot(record)?),
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &AuditFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<AuditEntry>> {
        let (items, total) = self.store.audit().list(filter, page, page_size).await?;
        Ok(Page::new(items, total, page, page_size))
    }

    pub async fn get(&self, id: i32) -> Result<Option<AuditEntry>> {
        self.store.audit().get(id).await
    }

    /// Every entry for one record, newest first.
    pub async fn history(&self, entity_type: EntityType, entity_id: i32) -> Result<Vec<AuditEntry>> {
        self.store
            .audit()
            .for_entity(entity_type.as_str(), entity_id)
            .await
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<AuditEntry>> {
        self.store.audit().recent(limit).await
    }

    /// Renders the filtered trail. Returns the body and its content type.
    pub async fn export(
        &self,
        filter: &AuditFilter,
        format: ExportFormat,
    ) -> Result<(String, &'static str)> {
        let entries = self.store.audit().list_all(filter).await?;

        match format {
            ExportFormat::Json => Ok((
                serde_json::to_string_pretty(&entries)?,
                "application/json",
            )),
            ExportFormat::Csv => Ok((entries_to_csv(&entries)?, "text/csv; charset=utf-8")),
        }
    }
}

fn entries_to_csv(entries: &[AuditEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "id",
        "created_at",
        "entity_type",
        "entity_id",
        "action",
        "actor",
        "changes",
    ])?;

    for entry in entries {
        let changes = entry
            .changes
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();

        writer.write_record([
            entry.id.to_string(),
            entry.created_at.clone(),
            entry.entity_type.clone(),
            entry.entity_id.to_string(),
            entry.action.clone(),
            entry.actor.clone(),
            changes,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("Audit CSV was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_to_csv_quotes_json() {
        let entries = vec![AuditEntry {
            id: 7,
            entity_type: "asset".to_string(),
            entity_id: 3,
            action: "update".to_string(),
            actor_id: Some(1),
            actor: "admin@assetdesk.local".to_string(),
            old_values: None,
            new_values: None,
            changes: Some(json!({"status": {"old": "available", "new": "lost"}})),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
        }];

        let csv = entries_to_csv(&entries).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("id,created_at,entity_type,entity_id,action,actor,changes")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("7,2024-01-01T00:00:00+00:00,asset,3,update,admin@assetdesk.local,"));
        assert!(row.contains(r#""{""status"":"#));
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
