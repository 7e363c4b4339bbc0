//! Uploaded spreadsheet grids.
//!
//! The upload layer hands over a header row and data rows of cell text.
//! Headers become field descriptors; each data row becomes a row keyed by
//! header name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extraction::field_mapping::FieldDescriptor;
use crate::models::SourceKind;

use super::SourceRows;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpreadsheetGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SpreadsheetGrid {
    /// Split parsed records into header and data rows.
    pub fn from_records(mut records: Vec<Vec<String>>) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let headers = records.remove(0);
        Self {
            headers,
            rows: records,
        }
    }

    /// Trimmed header names; blank or repeated headers get a positional name
    /// so every column stays addressable.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.headers.len());
        for (index, header) in self.headers.iter().enumerate() {
            let trimmed = header.trim();
            let name = if trimmed.is_empty() || names.iter().any(|n| n == trimmed) {
                self.positional_name(index, &names)
            } else {
                trimmed.to_string()
            };
            names.push(name);
        }
        names
    }

    /// `column{N}` for the 1-based position, suffixed until it clashes with
    /// neither an assigned name nor a later header.
    fn positional_name(&self, index: usize, assigned: &[String]) -> String {
        let taken = |candidate: &str| {
            assigned.iter().any(|n| n == candidate)
                || self.headers[index + 1..].iter().any(|h| h.trim() == candidate)
        };
        let base = format!("column{}", index + 1);
        let mut name = base.clone();
        let mut suffix = 2;
        while taken(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        name
    }

    pub fn into_source_rows(self, name: &str) -> SourceRows {
        let columns = self.column_names();
        let fields = columns.iter().map(|c| FieldDescriptor::named(c)).collect();

        let rows = self
            .rows
            .into_iter()
            .map(|cells| {
                // Short rows simply lack the trailing columns
                let row: Map<String, Value> = columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| (column.clone(), Value::String(cell)))
                    .collect();
                Value::Object(row)
            })
            .collect();

        SourceRows {
            kind: SourceKind::Spreadsheet,
            name: name.to_string(),
            fields,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_header_and_rows() {
        let grid = SpreadsheetGrid::from_records(records(&[
            &["Timestamp", " PM2.5 ", "Humidity"],
            &["2026-01-29 10:00:00", "12", "55"],
            &["2026-01-29 10:05:00", "13"],
        ]));
        let source = grid.into_source_rows("upload.csv");

        assert_eq!(source.kind, SourceKind::Spreadsheet);
        assert_eq!(source.fields[1], FieldDescriptor::named("PM2.5"));
        assert_eq!(source.rows.len(), 2);
        assert_eq!(source.rows[0]["PM2.5"], json!("12"));
        assert!(source.rows[1].get("Humidity").is_none());
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let grid = SpreadsheetGrid {
            headers: vec!["pm10".into(), "".into(), "pm10".into()],
            rows: vec![],
        };
        assert_eq!(grid.column_names(), vec!["pm10", "column2", "column3"]);
    }

    #[test]
    fn test_positional_names_never_collide_with_headers() {
        let grid = SpreadsheetGrid {
            headers: vec!["column2".into(), "".into()],
            rows: vec![vec!["1".into(), "2".into()]],
        };
        assert_eq!(grid.column_names(), vec!["column2", "column2_2"]);

        let source = grid.into_source_rows("clash.csv");
        assert_eq!(source.rows[0]["column2"], json!("1"));
        assert_eq!(source.rows[0]["column2_2"], json!("2"));

        let grid = SpreadsheetGrid {
            headers: vec!["".into(), "column1".into()],
            rows: vec![],
        };
        assert_eq!(grid.column_names(), vec!["column1_2", "column1"]);
    }

    #[test]
    fn test_empty_records() {
        let grid = SpreadsheetGrid::from_records(vec![]);
        assert!(grid.headers.is_empty());
        assert!(grid.into_source_rows("empty.csv").rows.is_empty());
    }
}
