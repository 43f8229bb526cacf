//! Tabular input: loading uploaded sheets and extracting recipients from one column.

mod load;

pub use load::{ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE, TableError};

use crate::domain::{NumberFormat, RawCell, RecipientIdentifier, RejectedEntry};

/// Column consulted when the caller does not name one.
pub const DEFAULT_COLUMN: &str = "mobile";

static EMPTY_CELL: RawCell = RawCell::Empty;

#[derive(Debug, Clone, PartialEq)]
/// One data row and the physical line it came from.
pub struct Row {
    source_row: usize,
    cells: Vec<RawCell>,
}

impl Row {
    pub fn new(source_row: usize, cells: Vec<RawCell>) -> Self {
        Self { source_row, cells }
    }

    /// 1-based physical row in the source file.
    pub fn source_row(&self) -> usize {
        self.source_row
    }

    /// Cell at `index`; a missing trailing cell reads as empty.
    pub fn cell(&self, index: usize) -> &RawCell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Header names plus data rows in source order.
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table whose header sits on row 1 and data starts on row 2.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RawCell>>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| Row::new(idx + 2, cells))
            .collect();
        Self::with_rows(columns, rows)
    }

    /// Build a table from rows that already know their physical position.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let columns = columns.into_iter().map(|c| c.trim().to_owned()).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("column '{column}' not found; available columns: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("input has no data rows")]
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq)]
/// Result of scanning one column: both lists keep source order.
pub struct Extraction {
    pub valid: Vec<RecipientIdentifier>,
    pub invalid: Vec<RejectedEntry>,
}

/// Normalize every value of `column`, splitting rows into recipients and rejects.
///
/// A table without data rows is [`ExtractError::EmptyInput`] whatever its header says.
pub fn extract(
    table: &Table,
    column: &str,
    format: &NumberFormat,
) -> Result<Extraction, ExtractError> {
    if table.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let index = table
        .column_index(column)
        .ok_or_else(|| ExtractError::ColumnNotFound {
            column: column.to_owned(),
            available: table.columns().to_vec(),
        })?;

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for row in table.rows() {
        let cell = row.cell(index);
        match format.normalize(cell) {
            Some(recipient) => valid.push(recipient),
            None => invalid.push(RejectedEntry::new(row.source_row(), cell.clone())),
        }
    }

    tracing::debug!(
        column,
        valid = valid.len(),
        invalid = invalid.len(),
        "extracted recipients"
    );
    Ok(Extraction { valid, invalid })
}
