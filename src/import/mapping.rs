use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset attribute a spreadsheet column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetField {
    AssetTag,
    Name,
    AssetType,
    Status,
    Category,
    AssignedTo,
    SerialNumber,
    Manufacturer,
    Model,
    Location,
    Notes,
    PurchaseDate,
    PurchaseCost,
    WarrantyExpires,
}

impl AssetField {
    pub const ALL: [Self; 14] = [
        Self::AssetTag,
        Self::Name,
        Self::AssetType,
        Self::Status,
        Self::Category,
        Self::AssignedTo,
        Self::SerialNumber,
        Self::Manufacturer,
        Self::Model,
        Self::Location,
        Self::Notes,
        Self::PurchaseDate,
        Self::PurchaseCost,
        Self::WarrantyExpires,
    ];

    pub const REQUIRED: [Self; 2] = [Self::AssetTag, Self::Name];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AssetTag => "asset_tag",
            Self::Name => "name",
            Self::AssetType => "asset_type",
            Self::Status => "status",
            Self::Category => "category",
            Self::AssignedTo => "assigned_to",
            Self::SerialNumber => "serial_number",
            Self::Manufacturer => "manufacturer",
            Self::Model => "model",
            Self::Location => "location",
            Self::Notes => "notes",
            Self::PurchaseDate => "purchase_date",
            Self::PurchaseCost => "purchase_cost",
            Self::WarrantyExpires => "warranty_expires",
        }
    }

    /// Header spellings commonly seen in inventory spreadsheets.
    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::AssetTag => &[
                "asset tag",
                "tag",
                "asset id",
                "asset number",
                "asset no",
                "inventory number",
                "inventory tag",
                "barcode",
            ],
            Self::Name => &["name", "asset name", "item", "device name", "hostname"],
            Self::AssetType => &["asset type", "type", "kind"],
            Self::Status => &["status", "state", "condition"],
            Self::Category => &["category", "category name", "group", "class"],
            Self::AssignedTo => &[
                "assigned to",
                "owner",
                "user",
                "employee",
                "employee id",
                "assignee",
                "email",
                "custodian",
            ],
            Self::SerialNumber => &["serial number", "serial", "serial no", "sn", "s/n"],
            Self::Manufacturer => &["manufacturer", "make", "vendor", "brand"],
            Self::Model => &["model", "model number", "model no"],
            Self::Location => &["location", "site", "office", "room", "building"],
            Self::Notes => &["notes", "note", "comments", "remarks", "description"],
            Self::PurchaseDate => &[
                "purchase date",
                "purchased",
                "date purchased",
                "acquired",
                "acquisition date",
            ],
            Self::PurchaseCost => &[
                "purchase cost",
                "cost",
                "price",
                "purchase price",
                "value",
                "amount",
            ],
            Self::WarrantyExpires => &[
                "warranty expires",
                "warranty",
                "warranty end",
                "warranty expiry",
                "warranty expiration",
            ],
        }
    }
}

impl fmt::Display for AssetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("Unknown asset field: {wanted}"))
    }
}

/// Suggested target for one spreadsheet column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingSuggestion {
    pub column: String,
    pub field: Option<AssetField>,
    pub score: f64,
}

/// Lower-cases and keeps only alphanumerics: `"Serial No."` -> `"serialno"`.
#[must_use]
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// `1 - distance / longer length`, in `0.0..=1.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Minimum length of the shorter side for a containment match to count.
const MIN_CONTAINMENT_LEN: usize = 3;

/// Best score of `header` against the field's canonical name and aliases.
#[must_use]
pub fn score(header: &str, field: AssetField) -> f64 {
    let header = normalize_header(header);
    if header.is_empty() {
        return 0.0;
    }

    std::iter::once(field.as_str())
        .chain(field.aliases().iter().copied())
        .map(|alias| {
            let alias = normalize_header(alias);
            if alias == header {
                1.0
            } else if shorter_len(&alias, &header) >= MIN_CONTAINMENT_LEN
                && (header.contains(&alias) || alias.contains(&header))
            {
                0.9
            } else {
                similarity(&alias, &header)
            }
        })
        .fold(0.0, f64::max)
}

fn shorter_len(a: &str, b: &str) -> usize {
    a.chars().count().min(b.chars().count())
}

/// Suggests a field per header. Pairs are taken greedily by descending
/// score so that every field and every column is used at most once; pairs
/// scoring below `threshold` are never suggested.
#[must_use]
pub fn suggest_mappings(headers: &[String], threshold: f64) -> Vec<MappingSuggestion> {
    let mut candidates: Vec<(usize, AssetField, f64)> = headers
        .iter()
        .enumerate()
        .flat_map(|(i, header)| {
            AssetField::ALL
                .into_iter()
                .map(move |field| (i, field, score(header, field)))
        })
        .filter(|(_, _, s)| *s >= threshold)
        .collect();

    candidates.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut suggestions: Vec<MappingSuggestion> = headers
        .iter()
        .map(|column| MappingSuggestion {
            column: column.clone(),
            field: None,
            score: 0.0,
        })
        .collect();
    let mut used_fields = Vec::new();

    for (index, field, s) in candidates {
        if suggestions[index].field.is_some() || used_fields.contains(&field) {
            continue;
        }
        suggestions[index].field = Some(field);
        suggestions[index].score = (s * 100.0).round() / 100.0;
        used_fields.push(field);
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Serial No."), "serialno");
        assert_eq!(normalize_header("  Asset_Tag "), "assettag");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_score_tiers() {
        assert!((score("Serial Number", AssetField::SerialNumber) - 1.0).abs() < f64::EPSILON);
        assert!((score("Device Serial", AssetField::SerialNumber) - 0.9).abs() < f64::EPSILON);
        let fuzzy = score("Manufactuer", AssetField::Manufacturer);
        assert!(fuzzy > 0.9 && fuzzy < 1.0, "fuzzy score was {fuzzy}");
        // Two-letter headers never match by containment.
        assert!(score("no", AssetField::SerialNumber) < 0.9);
    }

    #[test]
    fn test_suggest_mappings_typical_sheet() {
        let suggestions = suggest_mappings(
            &headers(&["Asset Tag", "Device Name", "S/N", "Owner Email", "Purchase Price", "Random"]),
            0.6,
        );

        let fields: Vec<Option<AssetField>> = suggestions.iter().map(|s| s.field).collect();
        assert_eq!(
            fields,
            vec![
                Some(AssetField::AssetTag),
                Some(AssetField::Name),
                Some(AssetField::SerialNumber),
                Some(AssetField::AssignedTo),
                Some(AssetField::PurchaseCost),
                None,
            ]
        );
        assert!((suggestions[0].score - 1.0).abs() < f64::EPSILON);
        assert!((suggestions[5].score).abs() < f64::EPSILON);
    }

    #[test]
    fn test_suggest_mappings_uses_each_field_once() {
        let suggestions = suggest_mappings(&headers(&["Tag", "Asset Tag"]), 0.6);

        assert_eq!(suggestions[0].field, Some(AssetField::AssetTag));
        assert_ne!(suggestions[1].field, Some(AssetField::AssetTag));
    }

    #[test]
    fn test_threshold_filters_weak_matches() {
        let suggestions = suggest_mappings(&headers(&["Manufactuer"]), 0.95);
        assert_eq!(suggestions[0].field, None);
    }

    #[test]
    fn test_field_round_trip() {
        for field in AssetField::ALL {
            assert_eq!(field.as_str().parse::<AssetField>(), Ok(field));
        }
        assert!("colour".parse::<AssetField>().is_err());
    }
}
