use csv::{ReaderBuilder, Trim};

/// A CSV document split into a header row and data rows of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    /// Data rows with their 1-based line number in the source (header is line 1).
    pub rows: Vec<(usize, Vec<String>)>,
    pub delimiter: char,
}

/// Picks the delimiter that occurs most often on the header line.
fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();

    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, first_line.bytes().filter(|b| *b == d).count()))
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| *count > 0)
        .map_or(b',', |(d, _)| d)
}

/// Parses CSV text. Blank rows are dropped; short rows are padded and long
/// rows truncated to the header width.
///
/// # Errors
///
/// Returns a message when the document has no header row, the CSV is
/// malformed, or it holds more than `max_rows` data rows.
pub fn parse_csv(text: &str, max_rows: usize) -> Result<ParsedCsv, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err("CSV is empty".to_string());
    }

    let delimiter = detect_delimiter(text);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let raw_headers = reader
        .headers()
        .map_err(|e| format!("Failed to read CSV header: {e}"))?
        .clone();

    let headers: Vec<String> = raw_headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                format!("Column {}", i + 1)
            } else {
                h.to_string()
            }
        })
        .collect();

    if raw_headers.iter().all(str::is_empty) {
        return Err("CSV header row is empty".to_string());
    }

    let width = headers.len();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| format!("Malformed CSV: {e}"))?;

        if record.iter().all(str::is_empty) {
            continue;
        }

        if rows.len() == max_rows {
            return Err(format!("CSV has more than {max_rows} data rows"));
        }

        let line = record
            .position()
            .map_or(rows.len() + 2, |p| usize::try_from(p.line()).unwrap_or(0));

        let mut values: Vec<String> = record.iter().map(str::to_string).collect();
        values.resize(width, String::new());
        rows.push((line, values));
    }

    Ok(ParsedCsv {
        headers,
        rows,
        delimiter: char::from(delimiter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_separated() {
        let csv = "Asset Tag,Name,Serial\nLT-1,Laptop,SN1\n\nLT-2,\"Monitor, 27\"\"\",SN2\n";
        let parsed = parse_csv(csv, 100).unwrap();

        assert_eq!(parsed.headers, vec!["Asset Tag", "Name", "Serial"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0], (2, vec!["LT-1".to_string(), "Laptop".to_string(), "SN1".to_string()]));
        assert_eq!(parsed.rows[1].1[1], "Monitor, 27\"");
        assert_eq!(parsed.delimiter, ',');
    }

    #[test]
    fn test_parse_semicolon_with_bom_and_ragged_rows() {
        let csv = "\u{feff}tag;name;cost\nA1;Desk\nA2;Chair;12,50;extra\n";
        let parsed = parse_csv(csv, 100).unwrap();

        assert_eq!(parsed.delimiter, ';');
        assert_eq!(parsed.headers[0], "tag");
        assert_eq!(parsed.rows[0].1, vec!["A1", "Desk", ""]);
        assert_eq!(parsed.rows[1].1, vec!["A2", "Chair", "12,50"]);
    }

    #[test]
    fn test_parse_names_blank_headers() {
        let parsed = parse_csv("tag,,name\n1,2,3\n", 10).unwrap();
        assert_eq!(parsed.headers, vec!["tag", "Column 2", "name"]);
    }

    #[test]
    fn test_parse_rejects_empty_and_oversized() {
        assert!(parse_csv("   \n", 10).is_err());
        assert!(parse_csv("a,b\n1,2\n3,4\n5,6\n", 2).is_err());
        assert!(parse_csv("a,b\n1,2\n3,4\n", 2).is_ok());
    }
}
