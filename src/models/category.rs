use serde::{Deserialize, Serialize};

use super::{clean_text, double_option};
use crate::entities::categories;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            parent_id: model.parent_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFields {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
}

impl CategoryInput {
    pub fn normalize(self) -> Result<CategoryFields, String> {
        Ok(CategoryFields {
            name: normalize_category_name(&self.name)?,
            description: clean_text(self.description),
            parent_id: self.parent_id,
        })
    }
}

impl CategoryPatch {
    pub fn apply(self, current: &Category) -> Result<CategoryFields, String> {
        Ok(CategoryFields {
            name: match self.name {
                Some(name) => normalize_category_name(&name)?,
                None => current.name.clone(),
            },
            description: match self.description {
                Some(value) => clean_text(value),
                None => current.description.clone(),
            },
            parent_id: self.parent_id.unwrap_or(current.parent_id),
        })
    }
}

fn normalize_category_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Category name is required".to_string());
    }
    if name.chars().count() > 100 {
        return Err("Category name must be 100 characters or less".to_string());
    }
    Ok(name.to_string())
}

/// Category row with the number of assets filed directly under it.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub asset_count: u64,
}

/// Nested view used by the category tree endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub asset_count: u64,
    pub children: Vec<CategoryNode>,
}

/// Builds a forest from flat rows. Rows whose parent is missing become roots.
#[must_use]
pub fn build_tree(summaries: &[CategorySummary]) -> Vec<CategoryNode> {
    let known: std::collections::HashSet<i32> =
        summaries.iter().map(|s| s.category.id).collect();

    fn children_of(parent: Option<i32>, rows: &[CategorySummary], known: &std::collections::HashSet<i32>) -> Vec<CategoryNode> {
        let mut nodes: Vec<CategoryNode> = rows
            .iter()
            .filter(|row| {
                let effective_parent = row.category.parent_id.filter(|p| known.contains(p));
                effective_parent == parent
            })
            .map(|row| CategoryNode {
                id: row.category.id,
                name: row.category.name.clone(),
                description: row.category.description.clone(),
                asset_count: row.asset_count,
                children: children_of(Some(row.category.id), rows, known),
            })
            .collect();
        nodes.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        nodes
    }

    children_of(None, summaries, &known)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i32, name: &str, parent_id: Option<i32>) -> CategorySummary {
        CategorySummary {
            category: Category {
                id,
                name: name.to_string(),
                description: None,
                parent_id,
                created_at: String::new(),
                updated_at: String::new(),
            },
            asset_count: 0,
        }
    }

    #[test]
    fn test_build_tree_nests_children() {
        let rows = vec![
            summary(1, "Hardware", None),
            summary(2, "Laptops", Some(1)),
            summary(3, "Monitors", Some(1)),
            summary(4, "Software", None),
            summary(5, "Orphan", Some(99)),
        ];

        let tree = build_tree(&rows);

        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Hardware", "Orphan", "Software"]);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].name, "Laptops");
    }

    #[test]
    fn test_patch_can_clear_parent() {
        let current = summary(2, "Laptops", Some(1)).category;
        let patch: CategoryPatch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();

        let fields = patch.apply(&current).unwrap();
        assert_eq!(fields.parent_id, None);
        assert_eq!(fields.name, "Laptops");
    }
}
