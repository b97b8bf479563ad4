use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::import_templates;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportTemplate {
    pub id: i32,
    pub name: String,
    /// Spreadsheet column -> asset field name.
    pub mappings: BTreeMap<String, String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<import_templates::Model> for ImportTemplate {
    fn from(model: import_templates::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            mappings: serde_json::from_str(&model.mappings).unwrap_or_default(),
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportTemplateInput {
    pub name: String,
    pub mappings: BTreeMap<String, String>,
}
