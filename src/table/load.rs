use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::domain::RawCell;
use crate::table::{Row, Table};

/// File extensions accepted for upload (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

/// 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("unsupported file type '{extension}' (expected one of: xlsx, xls, csv)")]
    UnsupportedFormat { extension: String },

    #[error("file is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
}

impl Table {
    /// Load an uploaded sheet, choosing the reader by file extension.
    ///
    /// Only the first worksheet of a workbook is read. The first row is the header.
    pub fn load(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self, TableError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(TableError::UnsupportedFormat { extension });
        }

        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(TableError::TooLarge {
                size,
                max: max_bytes,
            });
        }

        let table = if extension == "csv" {
            Self::from_csv_reader(File::open(path)?)?
        } else {
            Self::from_workbook(path)?
        };
        tracing::info!(
            path = %path.display(),
            columns = table.columns().len(),
            rows = table.rows().len(),
            "loaded sheet"
        );
        Ok(table)
    }

    /// Parse CSV with a header record. Rows are numbered by their starting line.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let columns = reader.headers()?.iter().map(str::to_owned).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let source_row = record
                .position()
                .map_or(rows.len() + 2, |pos| pos.line() as usize);
            let cells = record.iter().map(|value| RawCell::text(value)).collect();
            rows.push(Row::new(source_row, cells));
        }
        Ok(Self::with_rows(columns, rows))
    }

    fn from_workbook(path: &Path) -> Result<Self, TableError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(TableError::NoWorksheet)??;
        Ok(Self::from_range(&range))
    }

    /// The used range may start below row 1; physical row numbers account for that.
    fn from_range(range: &Range<Data>) -> Self {
        let header_row = range.start().map_or(0, |(row, _)| row as usize) + 1;
        let mut rows = range.rows();

        let columns = match rows.next() {
            Some(header) => header.iter().map(ToString::to_string).collect(),
            None => return Self::default(),
        };
        let rows = rows
            .enumerate()
            .map(|(idx, cells)| {
                Row::new(
                    header_row + idx + 1,
                    cells.iter().map(cell_from_data).collect(),
                )
            })
            .collect();
        Self::with_rows(columns, rows)
    }
}

fn cell_from_data(data: &Data) -> RawCell {
    match data {
        Data::Int(value) => RawCell::Number(*value as f64),
        Data::Float(value) => RawCell::Number(*value),
        Data::String(value) => RawCell::text(value.as_str()),
        Data::Empty => RawCell::Empty,
        other => RawCell::text(other.to_string()),
    }
}
