//! HTTP implementation of the backend traits.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::{BackendResponse, UploadedFile};
use super::{BulkBackend, ListBackend, Resource, UploadBackend};
use crate::config::{AdminConfig, BatchAtomicity};
use crate::error::{BackendError, BackendResult};
use crate::models::{CellValue, Page, UploadDestination};
use crate::query::QuerySpec;
use crate::upload::SelectedFile;

/// Upload endpoint path.
pub const UPLOAD_PATH: &str = "/api/v1/file/upload";

/// Bulk user creation endpoint path.
pub const BULK_CREATE_PATH: &str = "/api/v1/user/bulk-create";

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "fileImg";

/// Header selecting the storage folder.
pub const UPLOAD_TYPE_HEADER: &str = "upload-type";

/// Client for the bookstore REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &AdminConfig) -> BackendResult<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Unwrap the envelope of a response.
    ///
    /// Non-2xx statuses become [`BackendError::Rejected`] with the envelope's
    /// message when the body has one, the raw body otherwise.
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<BackendResponse<T>>(&body) {
            Ok(envelope) if status.is_success() => envelope.into_data(status.as_u16()),
            Ok(envelope) => Err(BackendError::Rejected {
                status: status.as_u16(),
                message: envelope.reason(),
            }),
            Err(_) if !status.is_success() => Err(BackendError::Rejected {
                status: status.as_u16(),
                message: if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("Request failed").to_string()
                } else {
                    body
                },
            }),
            Err(e) => Err(BackendError::InvalidResponse(e.to_string())),
        }
    }
}

impl UploadBackend for HttpBackend {
    async fn upload_file(&self, file: &SelectedFile, destination: UploadDestination) -> BackendResult<String> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        log::debug!("POST {} ({} bytes, {})", UPLOAD_PATH, file.size(), destination);

        let response = self
            .authorize(self.client.post(self.url(UPLOAD_PATH)))
            .header(UPLOAD_TYPE_HEADER, destination.folder())
            .multipart(form)
            .send()
            .await?;

        let uploaded: UploadedFile = Self::read_envelope(response).await?;
        Ok(uploaded.file_uploaded)
    }
}

impl BulkBackend for HttpBackend {
    async fn bulk_create_users(
        &self,
        users: &[BTreeMap<String, CellValue>],
        atomicity: BatchAtomicity,
    ) -> BackendResult<Value> {
        let mut request = self.authorize(self.client.post(self.url(BULK_CREATE_PATH)));
        if let Some(mode) = atomicity.as_query_value() {
            request = request.query(&[("mode", mode)]);
        }

        log::debug!("POST {} ({} users)", BULK_CREATE_PATH, users.len());

        let response = request.json(users).send().await?;
        Self::read_envelope(response).await
    }
}

impl ListBackend for HttpBackend {
    async fn fetch_page<T: DeserializeOwned>(&self, resource: Resource, query: &QuerySpec) -> BackendResult<Page<T>> {
        let url = format!("{}?{}", self.url(resource.path()), query.encode());
        log::debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::read_envelope(response).await
    }
}
