use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::error::FilterError;
use crate::status::{Status, Warning};

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An in-memory inventory table: ordered headers plus ordered rows.
///
/// Rows are always aligned with `headers` (decoding pads short records with
/// empty cells and drops cells past the last header).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Build a table from string literals. Rows are aligned to the headers.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|v| v.to_string()).collect());
        }
        table
    }

    /// Same headers, different rows.
    pub fn with_rows(&self, rows: Vec<Vec<String>>) -> Self {
        Self { headers: self.headers.clone(), rows }
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact (already normalized) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Values of one column in row order, or `None` if the column is absent.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.get(idx).map(|s| s.as_str()).unwrap_or("")).collect())
    }

    /// Index of `name`, appending an empty column if it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value.into();
        }
    }

    // -----------------------------------------------------------------------
    // CSV codec
    // -----------------------------------------------------------------------

    /// Decode CSV text with a header row. A leading UTF-8 BOM is ignored.
    pub fn from_csv(data: &str) -> Result<Self, FilterError> {
        let data = data.strip_prefix('\u{feff}').unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut table = Self::new(headers);

        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            row.truncate(table.headers.len());
            table.push_row(row);
        }

        Ok(table)
    }

    pub fn read_csv(path: &Path) -> Result<Self, FilterError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| FilterError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_csv(&data)
    }

    /// Encode as CSV text with a header row.
    pub fn to_csv(&self) -> Result<String, FilterError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| FilterError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| FilterError::Csv(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Which table a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Vendor,
    Master,
    Output,
}

impl std::fmt::Display for TableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vendor => write!(f, "vendor"),
            Self::Master => write!(f, "master"),
            Self::Output => write!(f, "output"),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Raw tables as supplied by the upload boundary, plus any SKUs already
/// recorded in the seen-SKU ledger.
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
    pub vendor: Option<Table>,
    pub master: Option<Table>,
    pub seen: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FilterSummary {
    pub vendor_rows: usize,
    pub known_skus: usize,
    pub new_skus: usize,
    pub output_rows: usize,
    pub groups: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_clusters: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: Table,
    pub new_keys: BTreeSet<String>,
    pub warnings: Vec<Warning>,
    pub summary: FilterSummary,
    pub meta: FilterMeta,
}

impl FilterOutcome {
    pub fn status(&self) -> Status {
        Status::from_outcome(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_pads_short_rows_and_strips_bom() {
        let table = Table::from_csv("\u{feff}Handle,Variant SKU,Title\nmug,A1\ncup,A2,Cup,extra\n").unwrap();
        assert_eq!(table.headers, vec!["Handle", "Variant SKU", "Title"]);
        assert_eq!(table.rows[0], vec!["mug", "A1", ""]);
        assert_eq!(table.rows[1], vec!["cup", "A2", "Cup"]);
    }

    #[test]
    fn encode_quotes_embedded_commas() {
        let table = Table::from_rows(&["Handle", "Title"], &[&["mug", "Mug, Red"]]);
        assert_eq!(table.to_csv().unwrap(), "Handle,Title\nmug,\"Mug, Red\"\n");
    }

    #[test]
    fn header_only_csv_is_empty_table() {
        let table = Table::from_csv("Handle,Variant SKU\n").unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn ensure_column_appends_once() {
        let mut table = Table::from_rows(&["a"], &[&["1"], &["2"]]);
        let idx = table.ensure_column("b");
        assert_eq!(idx, 1);
        assert_eq!(table.ensure_column("b"), 1);
        assert_eq!(table.rows[1], vec!["2", ""]);
        table.set_cell(1, idx, "x");
        assert_eq!(table.cell(1, 1), "x");
    }

    #[test]
    fn column_values_absent_column() {
        let table = Table::from_rows(&["a"], &[&["1"]]);
        assert!(table.column_values("b").is_none());
        assert_eq!(table.column_values("a").unwrap(), vec!["1"]);
    }
}
