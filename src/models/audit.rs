use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AuditAction, EntityType};
use crate::entities::audit_logs;

/// An audit row with its JSON columns decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: i32,
    pub entity_type: String,
    pub entity_id: i32,
    pub action: String,
    pub actor_id: Option<i32>,
    pub actor: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub changes: Option<Value>,
    pub created_at: String,
}

impl From<audit_logs::Model> for AuditEntry {
    fn from(model: audit_logs::Model) -> Self {
        let decode = |raw: Option<String>| raw.and_then(|s| serde_json::from_str(&s).ok());

        Self {
            id: model.id,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            action: model.action,
            actor_id: model.actor_id,
            actor: model.actor,
            old_values: decode(model.old_values),
            new_values: decode(model.new_values),
            changes: decode(model.changes),
            created_at: model.created_at,
        }
    }
}

/// Row about to be appended.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub entity_type: EntityType,
    pub entity_id: i32,
    pub action: AuditAction,
    pub actor_id: Option<i32>,
    pub actor: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub changes: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub action: Option<String>,
    /// Substring match on the actor name.
    pub actor: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD` or RFC 3339.
    pub from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD` or RFC 3339.
    pub to: Option<String>,
}
