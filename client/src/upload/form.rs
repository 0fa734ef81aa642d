//! Book media form: the thumbnail and slider fields of the book screens.

use super::controller::{FieldValue, SlotMode, UploadSlotController};
use crate::models::{BookRow, UploadDestination};
use crate::notice::Notifier;

/// Image fields of a book.
///
/// Owns its two controllers exclusively; closing or resetting the form
/// destroys every slot.
#[derive(Debug)]
pub struct BookMediaForm {
    pub thumbnail: UploadSlotController,
    pub slider: UploadSlotController,
}

/// Stored names ready to be sent with a create/update book request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookMedia {
    pub thumbnail: Option<String>,
    pub slider: Vec<String>,
}

impl BookMediaForm {
    pub fn new(image_base_url: &str, notifier: Notifier) -> Self {
        Self {
            thumbnail: UploadSlotController::new(
                SlotMode::Single,
                UploadDestination::Book,
                image_base_url,
                notifier.clone(),
            ),
            slider: UploadSlotController::new(
                SlotMode::Multi,
                UploadDestination::Book,
                image_base_url,
                notifier,
            ),
        }
    }

    /// Form pre-filled with a stored book's images (view screen).
    pub fn for_book(book: &BookRow, image_base_url: &str, notifier: Notifier) -> Self {
        let mut form = Self::new(image_base_url, notifier);
        form.thumbnail.seed(book.thumbnail.iter().cloned());
        form.slider.seed(book.slider.iter().cloned());
        form
    }

    /// Current stored names of both fields.
    pub fn media(&self) -> BookMedia {
        let thumbnail = match self.thumbnail.field_value() {
            FieldValue::Single(name) => name,
            FieldValue::Multi(names) => names.into_iter().next(),
        };
        let slider = match self.slider.field_value() {
            FieldValue::Multi(names) => names,
            FieldValue::Single(name) => name.into_iter().collect(),
        };
        BookMedia { thumbnail, slider }
    }

    /// Both fields hold a finished upload and nothing is still in flight.
    pub fn is_complete(&self) -> bool {
        let media = self.media();
        media.thumbnail.is_some()
            && !media.slider.is_empty()
            && !self.thumbnail.is_uploading()
            && !self.slider.is_uploading()
    }

    pub fn reset(&mut self) {
        self.thumbnail.reset();
        self.slider.reset();
    }
}
