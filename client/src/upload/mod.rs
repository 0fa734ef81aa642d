//! Image upload orchestration.
//!
//! - [`slot`] - slot state and the transition reducer
//! - [`controller`] - per-field slot controller and upload drivers
//! - [`form`] - the thumbnail + slider fields of the book screens

pub mod controller;
pub mod form;
pub mod slot;

pub use controller::{
    select_and_upload, upload, upload_all, validate_file, Applied, FieldValue, PendingUpload,
    SlotMode, UploadOutcome, UploadSlotController,
};
pub use form::{BookMedia, BookMediaForm};
pub use slot::{transition, SelectedFile, SlotEvent, SlotId, SlotStatus, UploadSlot};
