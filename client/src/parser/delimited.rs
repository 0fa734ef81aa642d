//! Delimited text (CSV) decoding with encoding and delimiter auto-detection.

use csv::ReaderBuilder;

use super::RawSheet;
use crate::error::{IngestError, IngestResult};
use crate::models::CellValue;

/// Name given to the single sheet of a CSV file.
pub const CSV_SHEET_NAME: &str = "csv";

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to text. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Detect the delimiter by counting occurrences in the first non-blank line
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best = b',';
    let mut best_count = 0;

    for sep in [b';', b',', b'\t', b'|'] {
        let count = first_line.matches(sep as char).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }

    best
}

/// Decode a CSV binary into a single sheet.
///
/// Cells are text, trimmed; blank cells are dropped later by the row mapper.
/// Row numbers are the 1-based line on which each record starts.
pub fn read_sheet(bytes: &[u8]) -> IngestResult<RawSheet> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    log::debug!("csv: encoding={}, delimiter='{}'", encoding, delimiter as char);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut sheet = RawSheet::new(CSV_SHEET_NAME);

    for result in reader.records() {
        let record = result.map_err(|e| IngestError::MalformedInput(e.to_string()))?;
        let byte = record.position().map(|p| p.byte()).unwrap_or(0);
        let line = line_at(content.as_bytes(), byte);
        let row_number = u32::try_from(line)
            .map_err(|_| IngestError::MalformedInput(format!("line {} out of range", line)))?;

        let cells = record
            .iter()
            .map(|raw| {
                let value = raw.trim();
                (!value.is_empty()).then(|| CellValue::Text(value.to_string()))
            })
            .collect();

        sheet.push_row(row_number, cells);
    }

    Ok(sheet)
}

/// 1-based line of the record starting at `byte`.
///
/// The reader reports the offset where it began scanning, which sits before
/// any blank lines it skipped, so those are stepped over first.
fn line_at(content: &[u8], byte: u64) -> usize {
    let mut start = usize::try_from(byte).unwrap_or(content.len()).min(content.len());
    while matches!(content.get(start), Some(b'\n' | b'\r')) {
        start += 1;
    }
    content[..start].iter().filter(|b| **b == b'\n').count() + 1
}
