use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::mapping::AssetField;
use crate::domain::{AssetStatus, AssetType};

/// Column index per mapped field, validated against the CSV headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMapping {
    columns: HashMap<AssetField, usize>,
}

impl ResolvedMapping {
    /// Validates a `column -> field` mapping against the header row.
    ///
    /// Blank field names leave a column unmapped.
    ///
    /// # Errors
    ///
    /// Returns every problem found: unknown columns or fields, a field
    /// mapped twice, and missing required fields.
    pub fn resolve(
        headers: &[String],
        mapping: &BTreeMap<String, String>,
    ) -> Result<Self, Vec<String>> {
        let mut columns = HashMap::new();
        let mut errors = Vec::new();

        for (column, field) in mapping {
            if field.trim().is_empty() {
                continue;
            }

            let Some(index) = headers.iter().position(|h| h == column) else {
                errors.push(format!("Column '{column}' is not in the CSV header"));
                continue;
            };

            match field.parse::<AssetField>() {
                Ok(field) => {
                    if columns.insert(field, index).is_some() {
                        errors.push(format!("Field '{field}' is mapped more than once"));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        for required in AssetField::REQUIRED {
            if !columns.contains_key(&required) {
                errors.push(format!("Required field '{required}' is not mapped"));
            }
        }

        if errors.is_empty() {
            Ok(Self { columns })
        } else {
            Err(errors)
        }
    }

    pub fn value<'a>(&self, record: &'a [String], field: AssetField) -> Option<&'a str> {
        self.columns
            .get(&field)
            .and_then(|i| record.get(*i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// One spreadsheet row with its values parsed but references
/// (category, owner) still unresolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub asset_tag: String,
    pub name: String,
    pub asset_type: AssetType,
    pub status: Option<AssetStatus>,
    /// Category name as written in the sheet.
    pub category: Option<String>,
    /// Employee id or email of the owner.
    pub owner: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_cost: Option<f64>,
    pub warranty_expires: Option<String>,
}

/// Parses a row. All field errors are collected rather than stopping at the first.
pub fn parse_row(
    line: usize,
    record: &[String],
    mapping: &ResolvedMapping,
) -> Result<ImportRow, Vec<String>> {
    let mut errors = Vec::new();
    let text = |field| mapping.value(record, field).map(str::to_string);

    let asset_tag = text(AssetField::AssetTag).unwrap_or_default();
    if asset_tag.is_empty() {
        errors.push("asset_tag is empty".to_string());
    }

    let name = text(AssetField::Name).unwrap_or_default();
    if name.is_empty() {
        errors.push("name is empty".to_string());
    }

    let asset_type: AssetType = match mapping.value(record, AssetField::AssetType) {
        Some(raw) => raw.parse().unwrap_or_else(|e: String| {
            errors.push(e);
            AssetType::default()
        }),
        None => AssetType::default(),
    };

    let status: Option<AssetStatus> = mapping
        .value(record, AssetField::Status)
        .and_then(|raw| raw.parse().map_err(|e: String| errors.push(e)).ok());

    let mut date = |field: AssetField| {
        mapping.value(record, field).and_then(|raw| {
            parse_date(raw)
                .map_err(|e| errors.push(format!("{field}: {e}")))
                .ok()
        })
    };
    let purchase_date = date(AssetField::PurchaseDate);
    let warranty_expires = date(AssetField::WarrantyExpires);

    let purchase_cost = mapping
        .value(record, AssetField::PurchaseCost)
        .and_then(|raw| {
            parse_cost(raw)
                .map_err(|e| errors.push(format!("purchase_cost: {e}")))
                .ok()
        });

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ImportRow {
        line,
        asset_tag,
        name,
        asset_type,
        status,
        category: text(AssetField::Category),
        owner: text(AssetField::AssignedTo),
        serial_number: text(AssetField::SerialNumber),
        manufacturer: text(AssetField::Manufacturer),
        model: text(AssetField::Model),
        location: text(AssetField::Location),
        notes: text(AssetField::Notes),
        purchase_date,
        purchase_cost,
        warranty_expires,
    })
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%b-%Y"];

/// Accepts the date spellings spreadsheets commonly export and returns `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    // Timestamps such as `2024-03-01T00:00:00Z` or `2024-03-01 08:00`.
    let candidate = match raw.find(['T', ' ']) {
        Some(pos) if pos == 10 => &raw[..10],
        _ => raw,
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .ok_or_else(|| format!("unrecognized date '{raw}'"))
}

/// Parses a money amount, ignoring currency symbols and thousands separators.
/// A single comma followed by exactly two digits is read as a decimal comma.
pub fn parse_cost(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if cleaned.is_empty() {
        return Err(format!("'{raw}' is not a number"));
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // 1.234,56
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // 12,50
        (Some(comma), None)
            if cleaned.matches(',').count() == 1 && cleaned.len() - comma - 1 == 2 =>
        {
            cleaned.replace(',', ".")
        }
        // 1,234
        (Some(_), None) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    let value: f64 = normalized
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{raw}' must be a non-negative amount"));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(c, f)| ((*c).to_string(), (*f).to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_reports_all_problems() {
        let headers = strings(&["Tag", "Name", "Cost"]);
        let errors = ResolvedMapping::resolve(
            &headers,
            &mapping(&[("Tag", "name"), ("Name", "name"), ("Missing", "notes"), ("Cost", "price")]),
        )
        .unwrap_err();

        assert!(errors.iter().any(|e| e.contains("more than once")));
        assert!(errors.iter().any(|e| e.contains("'Missing'")));
        assert!(errors.iter().any(|e| e.contains("price")));
        assert!(errors.iter().any(|e| e.contains("asset_tag")));
    }

    #[test]
    fn test_parse_row() {
        let headers = strings(&["Tag", "Name", "State", "Bought", "Price", "Dept"]);
        let resolved = ResolvedMapping::resolve(
            &headers,
            &mapping(&[
                ("Tag", "asset_tag"),
                ("Name", "name"),
                ("State", "status"),
                ("Bought", "purchase_date"),
                ("Price", "purchase_cost"),
                ("Dept", ""),
            ]),
        )
        .unwrap();

        let row = parse_row(
            2,
            &strings(&["lt-9", "Laptop", "In Use", "03/15/2023", "$1,299.00", "IT"]),
            &resolved,
        )
        .unwrap();

        assert_eq!(row.asset_tag, "lt-9");
        assert_eq!(row.status, Some(AssetStatus::Assigned));
        assert_eq!(row.purchase_date.as_deref(), Some("2023-03-15"));
        assert_eq!(row.purchase_cost, Some(1299.0));
        assert_eq!(row.asset_type, AssetType::Hardware);
    }

    #[test]
    fn test_parse_row_collects_errors() {
        let headers = strings(&["Tag", "Name", "Status", "Warranty"]);
        let resolved = ResolvedMapping::resolve(
            &headers,
            &mapping(&[
                ("Tag", "asset_tag"),
                ("Name", "name"),
                ("Status", "status"),
                ("Warranty", "warranty_expires"),
            ]),
        )
        .unwrap();

        let errors =
            parse_row(3, &strings(&["", "Desk", "broken", "someday"]), &resolved).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("asset_tag"));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-31").unwrap(), "2024-01-31");
        assert_eq!(parse_date("2024/01/31").unwrap(), "2024-01-31");
        assert_eq!(parse_date("01/31/2024").unwrap(), "2024-01-31");
        assert_eq!(parse_date("31.01.2024").unwrap(), "2024-01-31");
        assert_eq!(parse_date("2024-01-31T10:00:00Z").unwrap(), "2024-01-31");
        assert!(parse_date("31/31/2024").is_err());
        assert!(parse_date("soon").is_err());
    }

    #[test]
    fn test_parse_cost_variants() {
        assert_eq!(parse_cost("1299").unwrap(), 1299.0);
        assert_eq!(parse_cost("$1,299.50").unwrap(), 1299.5);
        assert_eq!(parse_cost("1.299,50 €").unwrap(), 1299.5);
        assert_eq!(parse_cost("12,50").unwrap(), 12.5);
        assert_eq!(parse_cost("1,299").unwrap(), 1299.0);
        assert!(parse_cost("free").is_err());
        assert!(parse_cost("-5").is_err());
    }
}
