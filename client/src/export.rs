//! User list export.
//!
//! Writes the rows of the current listing page as CSV, the file the users
//! table offers for download. Only identifying columns are exported, with
//! the creation timestamp reduced to a date.

use chrono::DateTime;
use csv::Writer;
use std::io;
use std::path::Path;

use crate::error::AdminResult;
use crate::models::UserRow;

/// File name used when no export path is given.
pub const USER_EXPORT_FILE_NAME: &str = "export-user.csv";

/// Column headers, in output order.
pub const USER_EXPORT_HEADERS: [&str; 4] = ["_id", "fullName", "email", "createdAt"];

/// Date format of the `createdAt` column.
pub const EXPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Render a backend timestamp as a calendar date (UTC).
///
/// Values that are not RFC 3339 are passed through untouched.
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(at) => at.naive_utc().format(EXPORT_DATE_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Write `rows` as CSV to `writer`. Returns the number of data rows written.
pub fn write_users_csv<W: io::Write>(rows: &[UserRow], writer: W) -> AdminResult<usize> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(USER_EXPORT_HEADERS)?;

    for row in rows {
        let created = row.created_at.as_deref().map(format_date).unwrap_or_default();
        csv.write_record([row.id.as_str(), row.full_name.as_str(), row.email.as_str(), created.as_str()])?;
    }

    csv.flush()?;
    Ok(rows.len())
}

/// Write `rows` to a CSV file at `path`, replacing any existing file.
pub fn export_users<P: AsRef<Path>>(rows: &[UserRow], path: P) -> AdminResult<usize> {
    let file = std::fs::File::create(path.as_ref())?;
    let written = write_users_csv(rows, io::BufWriter::new(file))?;
    log::info!("exported {} user(s) to {}", written, path.as_ref().display());
    Ok(written)
}
