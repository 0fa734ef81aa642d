//! Error types for the bookstore admin core.
//!
//! Each subsystem owns its error enum:
//!
//! - [`UploadError`] - file validation and upload failures
//! - [`IngestError`] - spreadsheet format and decoding failures
//! - [`SchemaError`] - column policy violations on ingested records
//! - [`SubmitError`] - bulk submission failures
//! - [`BackendError`] - transport and envelope failures from the REST backend
//! - [`ConfigError`] - invalid configuration values
//! - [`AdminError`] - top-level wrapper used by the CLI
//!
//! Conversion into [`AdminError`] is automatic via `From` implementations,
//! allowing `?` to work across subsystem boundaries.

use thiserror::Error;

// =============================================================================
// Upload Errors
// =============================================================================

/// A single client-side predicate a selected file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// MIME type is not in the allow-list.
    DisallowedType,
    /// File is not strictly below the size ceiling.
    TooLarge,
}

impl Rejection {
    /// Message shown to the user for this rejection.
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::DisallowedType => "You can only upload JPG/PNG file!",
            Rejection::TooLarge => "Image must smaller than 2MB!",
        }
    }
}

/// Errors while selecting or uploading a file.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    /// File failed client-side checks; it never reached the network.
    #[error("File rejected: {}", join_rejections(.0))]
    ValidationRejected(Vec<Rejection>),

    /// Network or server error during upload.
    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

fn join_rejections(rejections: &[Rejection]) -> String {
    rejections
        .iter()
        .map(Rejection::message)
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while turning a spreadsheet binary into records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File type is not one of CSV, XLSX, XLS.
    #[error("Unsupported import file type: {0}")]
    UnsupportedFormat(String),

    /// Binary could not be decoded as the declared format.
    #[error("Malformed spreadsheet: {0}")]
    MalformedInput(String),

    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// One column policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Row carries a column the schema does not declare.
    UnexpectedColumn { row: u32, column: String },
    /// Row lacks a column the schema declares.
    MissingColumn { row: u32, column: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::UnexpectedColumn { row, column } => {
                write!(f, "Row {}: unexpected column '{}'", row, column)
            }
            Violation::MissingColumn { row, column } => {
                write!(f, "Row {}: missing column '{}'", row, column)
            }
        }
    }
}

/// Records do not satisfy the import schema.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Schema '{schema}' rejected {} row(s): {}", .violations.len(), first_violation(.violations))]
pub struct SchemaError {
    pub schema: String,
    pub violations: Vec<Violation>,
}

fn first_violation(violations: &[Violation]) -> String {
    violations
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

// =============================================================================
// Submission Errors
// =============================================================================

/// Errors from the bulk submission coordinator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmitError {
    /// Nothing is staged.
    #[error("No records to import")]
    EmptyBatch,

    /// Backend refused the batch or the request failed; message is verbatim.
    #[error("{0}")]
    SubmissionFailed(String),
}

// =============================================================================
// Backend Errors
// =============================================================================

/// Errors talking to the REST backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Request could not be sent or the body could not be read.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with an error; message extracted from the envelope when present.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Response body did not match the expected envelope.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Message to show the user, verbatim from the backend when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

// =============================================================================
// Top-level
// =============================================================================

/// Top-level error wrapping every subsystem error.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type UploadResult<T> = Result<T, UploadError>;

pub type IngestResult<T> = Result<T, IngestError>;

pub type SubmitResult<T> = Result<T, SubmitError>;

pub type BackendResult<T> = Result<T, BackendError>;

pub type AdminResult<T> = Result<T, AdminError>;
