//! Spreadsheet import: CSV reading, column-to-field suggestions and row parsing.

pub mod csv_reader;
pub mod mapping;
pub mod row;

pub use csv_reader::{ParsedCsv, parse_csv};
pub use mapping::{AssetField, MappingSuggestion, suggest_mappings};
pub use row::{ImportRow, ResolvedMapping, parse_row};
