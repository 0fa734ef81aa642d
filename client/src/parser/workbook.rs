//! Workbook (XLSX / XLS) decoding through calamine.

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use chrono::Timelike;
use std::fmt::Display;
use std::io::Cursor;

use super::{ImportFormat, RawSheet};
use crate::error::{IngestError, IngestResult};
use crate::models::CellValue;

type Source = Cursor<Vec<u8>>;

fn malformed(err: impl Display) -> IngestError {
    IngestError::MalformedInput(err.to_string())
}

/// Decode every worksheet of a workbook, in workbook order.
pub fn read_sheets(bytes: &[u8], format: ImportFormat) -> IngestResult<Vec<RawSheet>> {
    let source = Cursor::new(bytes.to_vec());
    match format {
        ImportFormat::Xlsx => collect(open_workbook_from_rs::<Xlsx<_>, _>(source).map_err(malformed)?),
        ImportFormat::Xls => collect(open_workbook_from_rs::<Xls<_>, _>(source).map_err(malformed)?),
        ImportFormat::Csv => Err(IngestError::UnsupportedFormat("csv is not a workbook".into())),
    }
}

fn collect<R>(mut workbook: R) -> IngestResult<Vec<RawSheet>>
where
    R: Reader<Source>,
    R::Error: Display,
{
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(malformed)?;
        sheets.push(sheet_from_range(&name, &range));
    }
    Ok(sheets)
}

/// Rows of a range with absolute 1-based numbers and absolute column positions.
fn sheet_from_range(name: &str, range: &Range<Data>) -> RawSheet {
    let mut sheet = RawSheet::new(name);
    let Some((first_row, first_col)) = range.start() else {
        return sheet;
    };

    for (offset, row) in range.rows().enumerate() {
        let mut cells: Vec<Option<CellValue>> = vec![None; first_col as usize];
        cells.extend(row.iter().map(cell_value));
        sheet.push_row(first_row + offset as u32 + 1, cells);
    }

    sheet
}

/// Map a calamine cell. Empty strings and error cells count as blank.
fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| CellValue::Text(s.to_string()))
        }
        Data::Int(i) => Some(CellValue::Integer(*i)),
        Data::Float(f) => Some(number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(excel) => match excel.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => {
                Some(CellValue::Text(dt.format("%Y-%m-%d").to_string()))
            }
            Some(dt) => Some(CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
            None => Some(number(excel.as_f64())),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => {
            log::warn!("ignoring error cell: {:?}", e);
            None
        }
    }
}

/// Spreadsheets store every number as a float; integral values become integers.
fn number(f: f64) -> CellValue {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        CellValue::Integer(f as i64)
    } else {
        CellValue::Float(f)
    }
}
