//! Wide annotation tables: one row per text, one stance column per entity.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{KamaeError, Result};

/// Name of the text column in every input table.
pub const TEXT_COLUMN: &str = "text";

/// A single annotated text with its stance cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WideRow {
    pub text: String,
    cells: BTreeMap<String, String>,
}

impl WideRow {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Adds a cell; builder style for tests and in-memory tables.
    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// Cell value, `None` when the cell is absent or blank.
    pub fn cell(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Rows plus the set of non-text columns the table declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WideTable {
    columns: Vec<String>,
    rows: Vec<WideRow>,
}

impl WideTable {
    /// Builds a table from explicit columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<WideRow>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table whose columns are the union of the rows' cells.
    pub fn from_rows(rows: Vec<WideRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.cells.keys() {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Reads a CSV file with a `text` header and arbitrary stance columns.
    ///
    /// Fields are whitespace-trimmed; empty fields are treated as missing.
    ///
    /// # Errors
    ///
    /// Failures carry the file path: `KamaeError::Io` when the file cannot be
    /// opened, `KamaeError::Csv` for malformed content, and
    /// `KamaeError::MissingColumn` when there is no `text` header.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| KamaeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file).map_err(|err| match err {
            KamaeError::Csv { source, .. } => KamaeError::Csv {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Reads CSV content from any reader. Errors carry an empty path.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let csv_err = |source| KamaeError::Csv {
            path: Default::default(),
            source,
        };

        // Only headers are trimmed; text cells keep their whitespace.
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers = reader.headers().map_err(csv_err)?.clone();

        let text_idx = headers
            .iter()
            .position(|h| h == TEXT_COLUMN)
            .ok_or_else(|| KamaeError::MissingColumn(TEXT_COLUMN.to_string()))?;
        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != text_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let mut row = WideRow::new(record.get(text_idx).unwrap_or_default());
            for (i, value) in record.iter().enumerate() {
                if i != text_idx && !value.trim().is_empty() {
                    row.cells.insert(headers[i].to_string(), value.to_string());
                }
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
