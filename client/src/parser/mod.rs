//! Spreadsheet ingestion.
//!
//! Turns an opaque CSV / XLSX / XLS binary into [`ImportRecord`]s. Each
//! sheet's row 1 is its header; every later non-empty row becomes one
//! record keyed by the header of its own sheet. Records are concatenated
//! in sheet order, then row order.

pub mod delimited;
pub mod workbook;

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::models::{CellValue, ImportRecord};

// =============================================================================
// Format detection
// =============================================================================

/// Accepted import formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Xlsx,
    Xls,
}

impl ImportFormat {
    /// Pick the format from a declared MIME type, then the file extension.
    pub fn detect(file_name: &str, mime_type: Option<&str>) -> IngestResult<Self> {
        if let Some(format) = mime_type.and_then(Self::from_mime) {
            return Ok(format);
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "xlsx" => Ok(ImportFormat::Xlsx),
            "xls" => Ok(ImportFormat::Xls),
            _ => Err(IngestError::UnsupportedFormat(file_name.to_string())),
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "text/csv" => Some(ImportFormat::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(ImportFormat::Xlsx),
            "application/vnd.ms-excel" => Some(ImportFormat::Xls),
            _ => None,
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormat::Csv => f.write_str("csv"),
            ImportFormat::Xlsx => f.write_str("xlsx"),
            ImportFormat::Xls => f.write_str("xls"),
        }
    }
}

// =============================================================================
// Decoded sheets
// =============================================================================

/// One decoded row: absolute 1-based number plus cells by column index.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: u32,
    pub cells: Vec<Option<CellValue>>,
}

impl RawRow {
    fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// A decoded sheet, before header mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, number: u32, cells: Vec<Option<CellValue>>) {
        self.rows.push(RawRow { number, cells });
    }
}

/// Header row of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetHeaders {
    pub sheet: String,
    /// Non-blank header names in column order. Empty when the sheet was skipped.
    pub headers: Vec<String>,
}

/// Output of an ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub format: ImportFormat,
    pub records: Vec<ImportRecord>,
    pub sheets: Vec<SheetHeaders>,
}

// =============================================================================
// Ingestion
// =============================================================================

/// Ingest a spreadsheet held in memory.
///
/// The format is checked before any decoding; an unparsable binary yields
/// [`IngestError::MalformedInput`] and no records.
pub fn ingest(bytes: &[u8], file_name: &str, mime_type: Option<&str>) -> IngestResult<Ingested> {
    let format = ImportFormat::detect(file_name, mime_type)?;

    let sheets = match format {
        ImportFormat::Csv => vec![delimited::read_sheet(bytes)?],
        ImportFormat::Xlsx | ImportFormat::Xls => workbook::read_sheets(bytes, format)?,
    };

    let mut records = Vec::new();
    let mut headers = Vec::with_capacity(sheets.len());

    for sheet in &sheets {
        let (sheet_headers, sheet_records) = map_sheet(sheet);
        log::debug!(
            "sheet '{}': {} column(s), {} record(s)",
            sheet.name,
            sheet_headers.headers.len(),
            sheet_records.len()
        );
        headers.push(sheet_headers);
        records.extend(sheet_records);
    }

    log::info!("ingested {} record(s) from '{}' ({})", records.len(), file_name, format);

    Ok(Ingested {
        format,
        records,
        sheets: headers,
    })
}

/// Ingest a spreadsheet from disk.
pub fn ingest_file<P: AsRef<Path>>(path: P) -> IngestResult<Ingested> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    // Reject unknown types before touching the disk.
    ImportFormat::detect(&file_name, None)?;

    let bytes = std::fs::read(path)?;
    ingest(&bytes, &file_name, None)
}

/// Map one sheet's rows onto its header.
fn map_sheet(sheet: &RawSheet) -> (SheetHeaders, Vec<ImportRecord>) {
    let mut result = SheetHeaders {
        sheet: sheet.name.clone(),
        headers: Vec::new(),
    };

    let Some(header_row) = sheet.rows.first().filter(|r| r.number == 1 && !r.is_empty()) else {
        return (result, Vec::new());
    };

    let columns: Vec<Option<String>> = header_row
        .cells
        .iter()
        .map(|cell| {
            cell.as_ref()
                .map(|v| v.to_string().trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .collect();
    result.headers = columns.iter().flatten().cloned().collect();

    let records = sheet.rows[1..]
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let mut record = ImportRecord::new(row.number);
            for (index, cell) in row.cells.iter().enumerate() {
                let (Some(Some(column)), Some(value)) = (columns.get(index), cell) else {
                    continue;
                };
                record.fields.insert(column.clone(), value.clone());
            }
            record
        })
        .filter(|record| !record.fields.is_empty())
        .collect();

    (result, records)
}
