//! Wire types of the bookstore REST backend.
//!
//! Every endpoint answers with the same envelope; `data` is present on
//! success and `message` carries the reason otherwise.

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, BackendResult};

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<MessageField>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `message` is either a single string or a list (validation errors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageField {
    One(String),
    Many(Vec<String>),
}

impl MessageField {
    /// Single line shown to the user; list entries are joined with ", ".
    pub fn text(&self) -> String {
        match self {
            MessageField::One(s) => s.clone(),
            MessageField::Many(items) => items.join(", "),
        }
    }
}

impl<T> BackendResponse<T> {
    /// Best message for the user: `message`, then `error`, then a generic fallback.
    pub fn reason(&self) -> String {
        self.message
            .as_ref()
            .map(MessageField::text)
            .filter(|m| !m.is_empty())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// `data` when present, otherwise a [`BackendError::Rejected`] carrying the reason.
    pub fn into_data(self, http_status: u16) -> BackendResult<T> {
        let status = self.status_code.unwrap_or(http_status);
        match self.data {
            Some(data) => Ok(data),
            None => Err(BackendError::Rejected {
                status,
                message: self.reason(),
            }),
        }
    }
}

/// `data` of the upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_uploaded: String,
}
