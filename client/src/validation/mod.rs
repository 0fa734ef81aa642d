//! Column policies for ingested records.
//!
//! An [`ImportSchema`] names the fields a screen expects and decides, per
//! kind of deviation, whether a record is let through or rejected:
//!
//! - a column the schema does not declare (`unexpected`)
//! - a declared column absent from the record (`missing`)
//!
//! # Example
//!
//! ```rust,ignore
//! use bookstore_admin::{ColumnPolicy, ImportRecord, ImportSchema};
//!
//! let schema = ImportSchema::users().on_unexpected(ColumnPolicy::Reject);
//! let records = vec![ImportRecord::new(2).with("email", "a@x.com").with("age", 42i64)];
//!
//! let err = schema.check(&records).unwrap_err();
//! assert_eq!(err.violations.len(), 1);
//! ```

use crate::error::{SchemaError, Violation};
use crate::models::ImportRecord;

/// What to do with a column deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnPolicy {
    /// Accept the record as-is; the backend has the final word.
    #[default]
    PassThrough,
    /// Report the deviation as a violation.
    Reject,
}

/// Expected fields plus column policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSchema {
    name: String,
    expected: Vec<String>,
    unexpected_columns: ColumnPolicy,
    missing_columns: ColumnPolicy,
}

impl ImportSchema {
    pub fn new(name: &str, expected: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
            unexpected_columns: ColumnPolicy::PassThrough,
            missing_columns: ColumnPolicy::PassThrough,
        }
    }

    /// User import: `fullName`, `email`, `phone`, both policies pass-through.
    pub fn users() -> Self {
        Self::new("users", &["fullName", "email", "phone"])
    }

    pub fn on_unexpected(mut self, policy: ColumnPolicy) -> Self {
        self.unexpected_columns = policy;
        self
    }

    pub fn on_missing(mut self, policy: ColumnPolicy) -> Self {
        self.missing_columns = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Violations of one record, in column order.
    pub fn violations(&self, record: &ImportRecord) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.unexpected_columns == ColumnPolicy::Reject {
            violations.extend(
                record
                    .fields
                    .keys()
                    .filter(|column| !self.expected.contains(column))
                    .map(|column| Violation::UnexpectedColumn {
                        row: record.row_number,
                        column: column.clone(),
                    }),
            );
        }

        if self.missing_columns == ColumnPolicy::Reject {
            violations.extend(
                self.expected
                    .iter()
                    .filter(|column| !record.fields.contains_key(column.as_str()))
                    .map(|column| Violation::MissingColumn {
                        row: record.row_number,
                        column: column.clone(),
                    }),
            );
        }

        violations
    }

    /// Check every record; all violations are collected before failing.
    pub fn check(&self, records: &[ImportRecord]) -> Result<(), SchemaError> {
        let violations: Vec<Violation> = records.iter().flat_map(|r| self.violations(r)).collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError {
                schema: self.name.clone(),
                violations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ImportRecord {
        ImportRecord::new(2)
            .with("fullName", "Alice")
            .with("email", "a@x.com")
            .with("age", 31i64)
    }

    #[test]
    fn test_users_schema_passes_everything_through() {
        let schema = ImportSchema::users();
        assert_eq!(schema.expected(), &["fullName", "email", "phone"]);
        assert!(schema.check(&[alice()]).is_ok());
        assert!(schema.check(&[]).is_ok());
    }

    #[test]
    fn test_reject_unexpected() {
        let schema = ImportSchema::users().on_unexpected(ColumnPolicy::Reject);
        let err = schema.check(&[alice()]).unwrap_err();

        assert_eq!(err.schema, "users");
        assert_eq!(
            err.violations,
            vec![Violation::UnexpectedColumn { row: 2, column: "age".into() }]
        );
    }

    #[test]
    fn test_reject_missing_collects_all_rows() {
        let schema = ImportSchema::users().on_missing(ColumnPolicy::Reject);
        let second = ImportRecord::new(3).with("email", "b@x.com");
        let err = schema.check(&[alice(), second]).unwrap_err();

        assert_eq!(
            err.violations,
            vec![
                Violation::MissingColumn { row: 2, column: "phone".into() },
                Violation::MissingColumn { row: 3, column: "fullName".into() },
                Violation::MissingColumn { row: 3, column: "phone".into() },
            ]
        );
    }
}
