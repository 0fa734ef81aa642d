//! Application configuration.
//!
//! Fixed constants shared by the upload and import paths, plus
//! [`AdminConfig`] loaded from the environment (a `.env` file is honored).

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// MIME types accepted for image uploads.
pub const ALLOWED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Upload size ceiling in bytes. Files must be strictly smaller.
///
/// 2 MiB.
pub const MAX_UPLOAD_SIZE: u64 = 2 * 1024 * 1024;

/// Initial password injected into every imported user.
pub const DEFAULT_IMPORT_PASSWORD: &str = "123456";

/// Capacity of the notice broadcast channel.
pub const NOTICE_CHANNEL_CAPACITY: usize = 100;

/// Default HTTP transport timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// How the backend should treat a bulk import batch.
///
/// The observable contract does not say whether the batch is atomic, so
/// the client never assumes; deployments pick a mode the backend documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchAtomicity {
    /// Send nothing and let the backend apply its own policy.
    #[default]
    BackendDefined,
    /// Whole batch succeeds or nothing is written.
    AllOrNothing,
    /// Each record is applied on its own.
    Independent,
}

impl BatchAtomicity {
    /// Query value forwarded to the bulk endpoint, if any.
    pub fn as_query_value(&self) -> Option<&'static str> {
        match self {
            BatchAtomicity::BackendDefined => None,
            BatchAtomicity::AllOrNothing => Some("atomic"),
            BatchAtomicity::Independent => Some("independent"),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "backend" => Some(BatchAtomicity::BackendDefined),
            "atomic" => Some(BatchAtomicity::AllOrNothing),
            "independent" => Some(BatchAtomicity::Independent),
            _ => None,
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Backend base URL, without trailing slash.
    pub backend_url: String,
    /// Bearer token forwarded as-is; issuing it is not our concern.
    pub access_token: Option<String>,
    /// Password injected into imported users.
    pub default_password: String,
    pub batch_atomicity: BatchAtomicity,
    /// Transport timeout of the HTTP client. Upload slots themselves never time out.
    pub http_timeout: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            access_token: None,
            default_password: DEFAULT_IMPORT_PASSWORD.to_string(),
            batch_atomicity: BatchAtomicity::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AdminConfig {
    /// Load from environment variables.
    ///
    /// `BACKEND_URL`, `ADMIN_ACCESS_TOKEN`, `IMPORT_DEFAULT_PASSWORD`,
    /// `IMPORT_BATCH_MODE` (`backend` | `atomic` | `independent`),
    /// `HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_backend_url(&url);
        }

        config.access_token = lookup("ADMIN_ACCESS_TOKEN").filter(|v| !v.trim().is_empty());

        if let Some(password) = lookup("IMPORT_DEFAULT_PASSWORD") {
            if password.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "IMPORT_DEFAULT_PASSWORD",
                    value: password,
                });
            }
            config.default_password = password;
        }

        if let Some(mode) = lookup("IMPORT_BATCH_MODE") {
            config.batch_atomicity = BatchAtomicity::parse(&mode).ok_or(ConfigError::InvalidValue {
                key: "IMPORT_BATCH_MODE",
                value: mode,
            })?;
        }

        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "HTTP_TIMEOUT_SECS",
                    value: secs,
                })?;
            config.http_timeout = Duration::from_secs(parsed);
        }

        Ok(config)
    }

    pub fn with_backend_url(mut self, url: &str) -> Self {
        self.backend_url = url.trim().trim_end_matches('/').to_string();
        self
    }
}
