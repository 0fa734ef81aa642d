//! Bulk user import.
//!
//! [`BulkSubmissionCoordinator`] is the state behind the import dialog:
//! records are staged after ingestion, previewed, then submitted to the
//! backend in a single request. A failed submission leaves everything in
//! place so the user can retry or cancel.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::api::BulkBackend;
use crate::config::{AdminConfig, BatchAtomicity};
use crate::error::{SchemaError, SubmitError, SubmitResult};
use crate::models::{CellValue, ImportRecord};
use crate::notice::{Notice, Notifier};
use crate::validation::ImportSchema;

/// Field injected into every submitted user.
pub const PASSWORD_FIELD: &str = "password";

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    /// Correlates client logs of this submission.
    pub batch_id: Uuid,
    pub submitted: usize,
    /// Listing screens should re-run their current query.
    pub refresh_listing: bool,
    /// Raw `data` returned by the backend.
    pub response: serde_json::Value,
}

/// Import dialog state.
#[derive(Debug)]
pub struct BulkSubmissionCoordinator {
    schema: ImportSchema,
    default_password: String,
    atomicity: BatchAtomicity,
    staged: Vec<ImportRecord>,
    dialog_open: bool,
    notifier: Notifier,
}

impl BulkSubmissionCoordinator {
    pub fn new(config: &AdminConfig, notifier: Notifier) -> Self {
        Self::with_schema(ImportSchema::users(), config, notifier)
    }

    pub fn with_schema(schema: ImportSchema, config: &AdminConfig, notifier: Notifier) -> Self {
        Self {
            schema,
            default_password: config.default_password.clone(),
            atomicity: config.batch_atomicity,
            staged: Vec::new(),
            dialog_open: false,
            notifier,
        }
    }

    pub fn open(&mut self) {
        self.dialog_open = true;
    }

    pub fn is_open(&self) -> bool {
        self.dialog_open
    }

    /// Stage freshly ingested records, replacing whatever was staged.
    ///
    /// Records failing the schema are not staged and the previous set is kept.
    pub fn stage(&mut self, records: Vec<ImportRecord>) -> Result<usize, SchemaError> {
        if let Err(err) = self.schema.check(&records) {
            self.notifier
                .notify(Notice::error("Invalid import file").with_description(err.to_string()));
            return Err(err);
        }

        self.staged = records;
        log::info!("staged {} record(s) for import", self.staged.len());
        Ok(self.staged.len())
    }

    pub fn staged(&self) -> &[ImportRecord] {
        &self.staged
    }

    /// Submit is only offered when something is staged.
    pub fn can_submit(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Close the dialog and drop staged records.
    pub fn cancel(&mut self) {
        self.dialog_open = false;
        self.staged.clear();
    }

    /// Staged records with the initial password set, overriding any supplied value.
    pub fn apply_defaults(&self) -> Vec<ImportRecord> {
        let password = CellValue::Text(self.default_password.clone());
        self.staged
            .iter()
            .map(|record| record.with_field(PASSWORD_FIELD, password.clone()))
            .collect()
    }

    /// Send every staged record in one call.
    ///
    /// On success the dialog closes and staged records are cleared. On
    /// failure the backend's message is surfaced verbatim and nothing changes.
    pub async fn submit<B: BulkBackend>(&mut self, backend: &B) -> SubmitResult<BulkOutcome> {
        if self.staged.is_empty() {
            self.notifier.warning(SubmitError::EmptyBatch.to_string());
            return Err(SubmitError::EmptyBatch);
        }

        let batch_id = Uuid::new_v4();
        let payload: Vec<BTreeMap<String, CellValue>> =
            self.apply_defaults().into_iter().map(|r| r.fields).collect();

        log::info!(
            "batch {}: submitting {} user(s) ({:?})",
            batch_id,
            payload.len(),
            self.atomicity
        );

        match backend.bulk_create_users(&payload, self.atomicity).await {
            Ok(response) => {
                let submitted = payload.len();
                self.staged.clear();
                self.dialog_open = false;
                self.notifier.success("Import users thành công");
                log::info!("batch {}: accepted", batch_id);

                Ok(BulkOutcome {
                    batch_id,
                    submitted,
                    refresh_listing: true,
                    response,
                })
            }
            Err(err) => {
                let message = err.user_message();
                log::warn!("batch {}: rejected: {}", batch_id, message);
                self.notifier
                    .notify(Notice::error("Error occurs").with_description(message.clone()));
                Err(SubmitError::SubmissionFailed(message))
            }
        }
    }
}
