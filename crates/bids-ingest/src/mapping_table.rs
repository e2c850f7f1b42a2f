//! Raw-to-anonymized identifier lookup table.
//!
//! The table is read either from a workbook (first worksheet) or from a
//! delimited text export. The first row is always the header row.

use std::path::{Path, PathBuf};

use bids_model::{ColumnOrder, MappingRow};
use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Header naming the raw identifier column in named mode.
pub const RAW_ID_COLUMN: &str = "RawID";
/// Header naming the anonymized identifier column in named mode.
pub const ANONYMIZED_ID_COLUMN: &str = "AnonymizedID";

/// How the identifier columns are located in the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingColumns {
    /// The first two columns, whatever their headers say.
    Positional(ColumnOrder),
    /// Columns headed `RawID` and `AnonymizedID`, anywhere in the row.
    Named,
}

#[derive(Debug, Clone)]
pub struct MappingTable {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<MappingRow>,
}

impl MappingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }
}

enum SourceKind {
    Delimited(u8),
    Workbook,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "csv" => Some(SourceKind::Delimited(b',')),
        "tsv" | "tab" => Some(SourceKind::Delimited(b'\t')),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceKind::Workbook),
        _ => None,
    }
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

/// Load the mapping table at `path`.
///
/// # Errors
///
/// Fails when the file is missing or unreadable, when its extension is not
/// supported, or when the header row does not satisfy `columns`.
pub fn load_mapping_table(path: &Path, columns: MappingColumns) -> Result<MappingTable> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let cells = match source_kind(path) {
        Some(SourceKind::Delimited(delimiter)) => read_delimited(path, delimiter)?,
        Some(SourceKind::Workbook) => read_workbook(path)?,
        None => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    let table = mapping_from_cells(path, cells, columns)?;
    debug!(
        source = %path.display(),
        rows = table.len(),
        "loaded mapping table"
    );
    Ok(table)
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| IngestError::csv(path, e))?;
    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::csv(path, e))?;
        cells.push(record.iter().map(normalize_cell).collect());
    }
    Ok(cells)
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>> {
    let spreadsheet_error = |message: String| IngestError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyTable {
            path: path.to_path_buf(),
        })?
        .map_err(|e| spreadsheet_error(e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a worksheet cell as the text a user sees in the sheet.
///
/// Whole numbers lose their `.0` so a numeric `12` matches folder `0012_x`
/// the same way the text `"12"` would.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => normalize_cell(&other.to_string()),
    }
}

/// Build a mapping table from raw cells whose first row is the header.
///
/// # Errors
///
/// Returns a schema error when the header row does not satisfy `columns`.
pub fn mapping_from_cells(
    source: &Path,
    cells: Vec<Vec<String>>,
    columns: MappingColumns,
) -> Result<MappingTable> {
    let mut lines = cells.into_iter();
    let headers: Vec<String> = lines
        .next()
        .ok_or_else(|| IngestError::EmptyTable {
            path: source.to_path_buf(),
        })?
        .iter()
        .map(|header| normalize_cell(header))
        .collect();
    let (raw_index, anon_index) = resolve_columns(source, &headers, columns)?;

    let mut rows = Vec::new();
    for (offset, line) in lines.enumerate() {
        let value = |index: usize| {
            line.get(index)
                .map(|cell| normalize_cell(cell))
                .unwrap_or_default()
        };
        let raw_id = value(raw_index);
        let anonymized_id = value(anon_index);
        if raw_id.is_empty() && anonymized_id.is_empty() {
            continue;
        }
        rows.push(MappingRow::new(raw_id, anonymized_id).with_row_number(offset + 2));
    }

    Ok(MappingTable {
        source: source.to_path_buf(),
        headers,
        rows,
    })
}

fn resolve_columns(
    source: &Path,
    headers: &[String],
    columns: MappingColumns,
) -> Result<(usize, usize)> {
    match columns {
        MappingColumns::Positional(order) => {
            let found = headers.len();
            if found < 2 {
                return Err(IngestError::TooFewColumns {
                    path: source.to_path_buf(),
                    found,
                });
            }
            Ok(order.indices())
        }
        MappingColumns::Named => {
            let raw = headers.iter().position(|header| header == RAW_ID_COLUMN);
            let anon = headers
                .iter()
                .position(|header| header == ANONYMIZED_ID_COLUMN);
            match (raw, anon) {
                (Some(raw), Some(anon)) => Ok((raw, anon)),
                _ => {
                    let mut missing = Vec::new();
                    if raw.is_none() {
                        missing.push(RAW_ID_COLUMN.to_string());
                    }
                    if anon.is_none() {
                        missing.push(ANONYMIZED_ID_COLUMN.to_string());
                    }
                    Err(IngestError::MissingColumns {
                        path: source.to_path_buf(),
                        missing,
                    })
                }
            }
        }
    }
}
