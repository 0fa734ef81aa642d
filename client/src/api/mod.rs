//! Backend API module.
//!
//! The core never talks HTTP directly; it goes through three narrow traits so
//! the upload, import and listing paths can run against an in-process fake:
//!
//! - [`UploadBackend`] - store one image, get back its stored name
//! - [`BulkBackend`] - create a batch of users in one call
//! - [`ListBackend`] - fetch one page of a listing
//!
//! [`HttpBackend`] implements all three against the bookstore REST API.

pub mod http;
pub mod types;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::BatchAtomicity;
use crate::error::BackendResult;
use crate::models::{CellValue, Page, UploadDestination};
use crate::query::QuerySpec;
use crate::upload::SelectedFile;

pub use http::HttpBackend;
pub use types::*;

/// Listing resources exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Books,
}

impl Resource {
    /// Path of the list endpoint, without query.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "/api/v1/user",
            Resource::Books => "/api/v1/book",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => f.write_str("users"),
            Resource::Books => f.write_str("books"),
        }
    }
}

/// Stores uploaded images.
#[allow(async_fn_in_trait)]
pub trait UploadBackend {
    /// Upload one file to `destination`; returns the server-assigned name.
    async fn upload_file(&self, file: &SelectedFile, destination: UploadDestination) -> BackendResult<String>;
}

/// Creates users in bulk.
#[allow(async_fn_in_trait)]
pub trait BulkBackend {
    /// Submit every user in one request. Succeeds iff the backend returned `data`.
    async fn bulk_create_users(
        &self,
        users: &[BTreeMap<String, CellValue>],
        atomicity: BatchAtomicity,
    ) -> BackendResult<Value>;
}

/// Fetches listing pages.
#[allow(async_fn_in_trait)]
pub trait ListBackend {
    async fn fetch_page<T: DeserializeOwned>(&self, resource: Resource, query: &QuerySpec) -> BackendResult<Page<T>>;
}
