//! # Bookstore Admin - upload, import and listing core
//!
//! Client-side core of the bookstore administration screens: image upload
//! slots for book and avatar fields, spreadsheet user import, and the
//! canonical query strings of the listing tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ Image files │────▶│ UploadSlot       │────▶│ POST file/upload│
//! │ (jpg / png) │     │ Controller       │     └─────────────────┘
//! └─────────────┘     └──────────────────┘
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────────┐
//! │ Spreadsheet │────▶│ Parser           │────▶│ BulkSubmission   │────▶│ POST user/bulk-create│
//! │ csv/xlsx/xls│     │ (calamine / csv) │     │ Coordinator      │     └──────────────────────┘
//! └─────────────┘     └──────────────────┘     └──────────────────┘
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ Table state │────▶│ ListQueryBuilder │────▶│ GET user / book │
//! └─────────────┘     └──────────────────┘     └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bookstore_admin::{ingest_file, AdminConfig, BulkSubmissionCoordinator, HttpBackend, Notifier};
//!
//! #[tokio::main]
//! async fn main() -> bookstore_admin::AdminResult<()> {
//!     let config = AdminConfig::from_env()?;
//!     let backend = HttpBackend::new(&config)?;
//!
//!     let mut import = BulkSubmissionCoordinator::new(&config, Notifier::new());
//!     import.stage(ingest_file("users.xlsx")?.records)?;
//!     let outcome = import.submit(&backend).await?;
//!     println!("Imported {} users", outcome.submitted);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Constants and environment configuration
//! - [`models`] - Records, cells, destinations, listing rows
//! - [`notice`] - User-visible notices
//! - [`upload`] - Upload slots and their controller
//! - [`parser`] - Spreadsheet ingestion
//! - [`validation`] - Import column policies
//! - [`import`] - Bulk user submission
//! - [`query`] - Listing query strings
//! - [`export`] - User list CSV export
//! - [`api`] - Backend traits and the HTTP client

// Core modules
pub mod config;
pub mod error;
pub mod models;
pub mod notice;

// Uploads
pub mod upload;

// Spreadsheet import
pub mod import;
pub mod parser;
pub mod validation;

// Listings
pub mod export;
pub mod query;

// Backend
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AdminError, AdminResult, BackendError, ConfigError, IngestError, Rejection, SchemaError,
    SubmitError, UploadError, Violation,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{AdminConfig, BatchAtomicity};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{BookRow, CellValue, ImportRecord, Page, PageMeta, UploadDestination, UserRow};

// =============================================================================
// Re-exports - Notices
// =============================================================================

pub use notice::{Notice, NoticeLevel, Notifier};

// =============================================================================
// Re-exports - Uploads
// =============================================================================

pub use upload::{
    select_and_upload, upload_all, Applied, BookMedia, BookMediaForm, FieldValue, PendingUpload,
    SelectedFile, SlotId, SlotMode, SlotStatus, UploadOutcome, UploadSlot, UploadSlotController,
};

// =============================================================================
// Re-exports - Import
// =============================================================================

pub use import::{BulkOutcome, BulkSubmissionCoordinator};
pub use parser::{ingest, ingest_file, ImportFormat, Ingested, SheetHeaders};
pub use validation::{ColumnPolicy, ImportSchema};

// =============================================================================
// Re-exports - Listings
// =============================================================================

pub use export::{export_users, write_users_csv, USER_EXPORT_FILE_NAME};
pub use query::{ListQueryBuilder, ListState, ListingSpec, QuerySpec, Sort, SortOrder};

// =============================================================================
// Re-exports - Backend
// =============================================================================

pub use api::{BulkBackend, HttpBackend, ListBackend, Resource, UploadBackend};
