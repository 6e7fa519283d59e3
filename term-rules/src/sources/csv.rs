//! CSV text to dataset rows.

use crate::core::Row;
use crate::prelude::*;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, instrument};

/// Options for parsing CSV input.
///
/// The first non-blank record is always the header.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Quote character
    pub quote: u8,
    /// Trim whitespace around every header and field
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: false,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

/// Parses CSV text with default options.
///
/// # Examples
///
/// ```rust
/// use term_rules::sources::parse_csv;
///
/// let rows = parse_csv("name,city\nAlice,Córdoba\n\nBob,\n").unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0]["city"], "Córdoba");
/// assert_eq!(rows[1]["city"], "");
/// ```
pub fn parse_csv(text: &str) -> Result<Vec<Row>> {
    parse_csv_with_options(text, &CsvOptions::default())
}

/// Parses CSV text into rows keyed by header name.
///
/// Blank records are skipped. Records shorter than the header leave the
/// trailing columns absent; fields beyond the header are dropped. Every
/// field is kept as a string.
pub fn parse_csv_with_options(text: &str, options: &CsvOptions) -> Result<Vec<Row>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .trim(if options.trim {
            ::csv::Trim::All
        } else {
            ::csv::Trim::None
        })
        .has_headers(true)
        .flexible(true)
        .from_reader(text.trim().as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| {
            RuleError::data_source_with_source("CSV", "Failed to read CSV header", Box::new(e))
        })?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            RuleError::data_source_with_source(
                "CSV",
                format!("Failed to read CSV record {}", index + 1),
                Box::new(e),
            )
        })?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| (header.to_string(), Value::String(field.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Reads and parses a CSV file.
#[instrument(skip_all, fields(csv.path = %path.as_ref().display()))]
pub async fn read_csv(path: impl AsRef<Path>) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
    let rows = parse_csv(&text)?;
    debug!(csv.rows = rows.len(), "Parsed CSV file");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_blank_lines() {
        let rows = parse_csv("\n\nid,nombre\n1,Ana\n   \n2,Luis\n\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["nombre"], "Luis");
        let keys: Vec<_> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "nombre"]);
    }

    #[test]
    fn test_short_record_leaves_fields_absent() {
        let rows = parse_csv("a,b,c\n1\n").unwrap();
        assert_eq!(rows[0].get("a"), Some(&Value::String("1".into())));
        assert!(rows[0].get("b").is_none());
    }

    #[test]
    fn test_quoted_fields_and_options() {
        let rows = parse_csv("a,b\n\"x, y\",\"dijo \"\"hola\"\"\"\n").unwrap();
        assert_eq!(rows[0]["a"], "x, y");
        assert_eq!(rows[0]["b"], "dijo \"hola\"");

        let options = CsvOptions::default().with_delimiter(b';').with_trim(true);
        let rows = parse_csv_with_options("a ; b\n 1 ; 2 \n", &options).unwrap();
        assert_eq!(rows[0]["b"], "2");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_csv("").unwrap().is_empty());
        assert!(parse_csv("solo,cabecera").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        tokio::fs::write(&path, "x\n1\n2\n").await.unwrap();
        assert_eq!(read_csv(&path).await.unwrap().len(), 2);

        let err = read_csv(dir.path().join("falta.csv")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read CSV file"));
    }
}
