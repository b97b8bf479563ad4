//! Field-level change computation for audit entries.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Bookkeeping fields that change on every write and carry no audit value.
const IGNORED_FIELDS: &[&str] = &["created_at", "updated_at"];

/// Shallow comparison of two JSON object snapshots.
///
/// Keys from both sides are considered; a key missing on one side compares
/// as `null`. Nested values are compared as whole values. Anything that is
/// not an object (including `None`) is treated as an empty object.
#[must_use]
pub fn diff(old: Option<&Value>, new: Option<&Value>) -> Map<String, Value> {
    let empty = Map::new();
    let old_fields = old.and_then(Value::as_object).unwrap_or(&empty);
    let new_fields = new.and_then(Value::as_object).unwrap_or(&empty);

    let keys: BTreeSet<&String> = old_fields.keys().chain(new_fields.keys()).collect();

    let mut changes = Map::new();
    for key in keys {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }

        let before = old_fields.get(key).unwrap_or(&Value::Null);
        let after = new_fields.get(key).unwrap_or(&Value::Null);

        if before != after {
            changes.insert(
                key.clone(),
                serde_json::json!({ "old": before, "new": after }),
            );
        }
    }

    changes
}

/// Serializes a record into the snapshot form stored on audit rows.
pub fn snapshot<T: Serialize>(record: &T) -> anyhow::Result<Value> {
    serde_json::to_value(record).map_err(|e| anyhow::anyhow!("Failed to snapshot record: {e}"))
}
