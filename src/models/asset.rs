use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{clean_text, double_option};
use crate::domain::{AssetStatus, AssetType};
use crate::entities::assets;

const MAX_TAG_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: i32,
    pub asset_tag: String,
    pub name: String,
    pub asset_type: AssetType,
    pub status: AssetStatus,
    pub category_id: Option<i32>,
    pub assigned_to: Option<i32>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_cost: Option<f64>,
    pub warranty_expires: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<assets::Model> for Asset {
    fn from(model: assets::Model) -> Self {
        Self {
            id: model.id,
            asset_tag: model.asset_tag,
            name: model.name,
            asset_type: model.asset_type.parse().unwrap_or_default(),
            status: model.status.parse().unwrap_or_default(),
            category_id: model.category_id,
            assigned_to: model.assigned_to,
            serial_number: model.serial_number,
            manufacturer: model.manufacturer,
            model: model.model,
            location: model.location,
            notes: model.notes,
            purchase_date: model.purchase_date,
            purchase_cost: model.purchase_cost,
            warranty_expires: model.warranty_expires,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Validated field set persisted by both create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFields {
    pub asset_tag: String,
    pub name: String,
    pub asset_type: AssetType,
    pub status: AssetStatus,
    pub category_id: Option<i32>,
    pub assigned_to: Option<i32>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_cost: Option<f64>,
    pub warranty_expires: Option<String>,
}

/// Create payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetInput {
    pub asset_tag: String,
    pub name: String,
    #[serde(default)]
    pub asset_type: AssetType,
    pub status: Option<AssetStatus>,
    pub category_id: Option<i32>,
    pub assigned_to: Option<i32>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_cost: Option<f64>,
    pub warranty_expires: Option<String>,
}

impl AssetInput {
    pub fn normalize(self) -> Result<AssetFields, String> {
        let status = resolve_status(self.status, None, self.assigned_to)?;

        Ok(AssetFields {
            asset_tag: normalize_tag(&self.asset_tag)?,
            name: normalize_name(&self.name)?,
            asset_type: self.asset_type,
            status,
            category_id: self.category_id,
            assigned_to: self.assigned_to,
            serial_number: clean_text(self.serial_number),
            manufacturer: clean_text(self.manufacturer),
            model: clean_text(self.model),
            location: clean_text(self.location),
            notes: clean_text(self.notes),
            purchase_date: normalize_date("purchase_date", self.purchase_date)?,
            purchase_cost: validate_cost(self.purchase_cost)?,
            warranty_expires: normalize_date("warranty_expires", self.warranty_expires)?,
        })
    }
}

/// Partial update payload. For nullable columns an explicit `null` clears
/// the value while an absent key leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetPatch {
    pub asset_tag: Option<String>,
    pub name: Option<String>,
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub serial_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub manufacturer: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub model: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_cost: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub warranty_expires: Option<Option<String>>,
}

impl AssetPatch {
    /// Merges the patch over `current` and re-validates the result.
    pub fn apply(self, current: &Asset) -> Result<AssetFields, String> {
        let assigned_to = self.assigned_to.unwrap_or(current.assigned_to);
        let status = resolve_status(self.status, Some(current.status), assigned_to)?;

        let asset_tag = match self.asset_tag {
            Some(tag) => normalize_tag(&tag)?,
            None => current.asset_tag.clone(),
        };
        let name = match self.name {
            Some(name) => normalize_name(&name)?,
            None => current.name.clone(),
        };

        Ok(AssetFields {
            asset_tag,
            name,
            asset_type: self.asset_type.unwrap_or(current.asset_type),
            status,
            category_id: self.category_id.unwrap_or(current.category_id),
            assigned_to,
            serial_number: merge_text(self.serial_number, &current.serial_number),
            manufacturer: merge_text(self.manufacturer, &current.manufacturer),
            model: merge_text(self.model, &current.model),
            location: merge_text(self.location, &current.location),
            notes: merge_text(self.notes, &current.notes),
            purchase_date: match self.purchase_date {
                Some(value) => normalize_date("purchase_date", value)?,
                None => current.purchase_date.clone(),
            },
            purchase_cost: match self.purchase_cost {
                Some(value) => validate_cost(value)?,
                None => current.purchase_cost,
            },
            warranty_expires: match self.warranty_expires {
                Some(value) => normalize_date("warranty_expires", value)?,
                None => current.warranty_expires.clone(),
            },
        })
    }
}

impl AssetFields {
    /// Field set of an existing record with a different owner, keeping the
    /// status rules consistent.
    pub fn with_owner(current: &Asset, owner: Option<i32>) -> Result<Self, String> {
        AssetPatch {
            assigned_to: Some(owner),
            ..AssetPatch::default()
        }
        .apply(current)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFilter {
    pub status: Option<AssetStatus>,
    pub asset_type: Option<AssetType>,
    pub category_id: Option<i32>,
    pub assigned_to: Option<i32>,
    /// Substring match on tag, name and serial number.
    pub q: Option<String>,
}

/// Decides the stored status from the requested one, the current one and
/// the owner after the write.
///
/// An owner on an `available` asset makes it `assigned`; removing the owner
/// of an `assigned` asset makes it `available`. Explicitly asking for
/// `assigned` without an owner is an error.
pub fn resolve_status(
    requested: Option<AssetStatus>,
    current: Option<AssetStatus>,
    owner: Option<i32>,
) -> Result<AssetStatus, String> {
    let base = requested.or(current).unwrap_or_default();

    match (base, owner) {
        (AssetStatus::Available, Some(_)) => Ok(AssetStatus::Assigned),
        (AssetStatus::Assigned, None) if requested == Some(AssetStatus::Assigned) => {
            Err("Status 'assigned' requires an owner".to_string())
        }
        (AssetStatus::Assigned, None) => Ok(AssetStatus::Available),
        (status, _) => Ok(status),
    }
}

fn normalize_tag(tag: &str) -> Result<String, String> {
    let tag = tag.trim().to_uppercase();

    if tag.is_empty() {
        return Err("Asset tag is required".to_string());
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(format!("Asset tag must be {MAX_TAG_LEN} characters or less"));
    }
    if tag.chars().any(char::is_whitespace) {
        return Err("Asset tag cannot contain whitespace".to_string());
    }

    Ok(tag)
}

fn normalize_name(name: &str) -> Result<String, String> {
    let name = name.trim();

    if name.is_empty() {
        return Err("Asset name is required".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("Asset name must be {MAX_NAME_LEN} characters or less"));
    }

    Ok(name.to_string())
}

fn normalize_date(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    let Some(value) = clean_text(value) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .map_err(|_| format!("{field} must be a date in YYYY-MM-DD format, got '{value}'"))
}

fn validate_cost(cost: Option<f64>) -> Result<Option<f64>, String> {
    match cost {
        Some(c) if !c.is_finite() || c < 0.0 => {
            Err("purchase_cost must be a non-negative number".to_string())
        }
        other => Ok(other),
    }
}

fn merge_text(patch: Option<Option<String>>, current: &Option<String>) -> Option<String> {
    match patch {
        Some(value) => clean_text(value),
        None => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_asset() -> Asset {
        Asset {
            id: 1,
            asset_tag: "LT-001".to_string(),
            name: "ThinkPad".to_string(),
            asset_type: AssetType::Hardware,
            status: AssetStatus::Assigned,
            category_id: Some(3),
            assigned_to: Some(9),
            serial_number: Some("SN1".to_string()),
            manufacturer: Some("Lenovo".to_string()),
            model: None,
            location: Some("HQ".to_string()),
            notes: None,
            purchase_date: Some("2023-05-01".to_string()),
            purchase_cost: Some(1200.0),
            warranty_expires: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_resolve_status_rules() {
        assert_eq!(resolve_status(None, None, None), Ok(AssetStatus::Available));
        assert_eq!(resolve_status(None, None, Some(1)), Ok(AssetStatus::Assigned));
        assert_eq!(
            resolve_status(None, Some(AssetStatus::Assigned), None),
            Ok(AssetStatus::Available)
        );
        assert_eq!(
            resolve_status(Some(AssetStatus::Maintenance), None, Some(1)),
            Ok(AssetStatus::Maintenance)
        );
        assert!(resolve_status(Some(AssetStatus::Assigned), None, None).is_err());
    }

    #[test]
    fn test_input_normalization() {
        let input = AssetInput {
            asset_tag: "  lt-100 ".to_string(),
            name: " Dell XPS ".to_string(),
            serial_number: Some("   ".to_string()),
            purchase_date: Some("2024-02-29".to_string()),
            ..AssetInput::default()
        };

        let fields = input.normalize().unwrap();
        assert_eq!(fields.asset_tag, "LT-100");
        assert_eq!(fields.name, "Dell XPS");
        assert_eq!(fields.serial_number, None);
        assert_eq!(fields.status, AssetStatus::Available);
        assert_eq!(fields.purchase_date.as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_input_rejects_bad_values() {
        let bad_tag = AssetInput {
            asset_tag: "LT 1".to_string(),
            name: "x".to_string(),
            ..AssetInput::default()
        };
        assert!(bad_tag.normalize().is_err());

        let bad_date = AssetInput {
            asset_tag: "LT-1".to_string(),
            name: "x".to_string(),
            purchase_date: Some("2023-02-30".to_string()),
            ..AssetInput::default()
        };
        assert!(bad_date.normalize().is_err());

        let bad_cost = AssetInput {
            asset_tag: "LT-1".to_string(),
            name: "x".to_string(),
            purchase_cost: Some(-5.0),
            ..AssetInput::default()
        };
        assert!(bad_cost.normalize().is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: AssetPatch =
            serde_json::from_str(r#"{"location": null, "name": "ThinkPad X1"}"#).unwrap();

        let fields = patch.apply(&sample_asset()).unwrap();
        assert_eq!(fields.location, None);
        assert_eq!(fields.name, "ThinkPad X1");
        assert_eq!(fields.manufacturer.as_deref(), Some("Lenovo"));
        assert_eq!(fields.category_id, Some(3));
    }

    #[test]
    fn test_unassigning_frees_the_asset() {
        let fields = AssetFields::with_owner(&sample_asset(), None).unwrap();
        assert_eq!(fields.assigned_to, None);
        assert_eq!(fields.status, AssetStatus::Available);
    }
}
