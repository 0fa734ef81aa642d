//! Upload slot state machine.
//!
//! A slot's status is a tagged enum; every change goes through
//! [`transition`], a pure reducer with no knowledge of rendering or I/O.

use bytes::Bytes;
use std::fmt;
use std::path::Path;

/// Opaque slot identifier. Assigned in selection order, never reused
/// within a controller, so ordering by id is presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub(crate) u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// Lifecycle status of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Idle,
    Uploading,
    /// Remote name and URL exist only here and never change afterwards.
    Done { remote_name: String, remote_url: String },
    Failed { reason: String },
}

impl SlotStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, SlotStatus::Done { .. })
    }

    pub fn remote_name(&self) -> Option<&str> {
        match self {
            SlotStatus::Done { remote_name, .. } => Some(remote_name),
            _ => None,
        }
    }

    pub fn remote_url(&self) -> Option<&str> {
        match self {
            SlotStatus::Done { remote_url, .. } => Some(remote_url),
            _ => None,
        }
    }
}

/// Events that drive a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEvent {
    UploadStarted,
    UploadSucceeded { remote_name: String, remote_url: String },
    UploadFailed { reason: String },
}

/// Next status for `event` applied to `status`.
///
/// Done is terminal. A failed slot is only retried by selecting a new file,
/// so `UploadStarted` is only honored from Idle.
pub fn transition(status: &SlotStatus, event: SlotEvent) -> SlotStatus {
    match (status, event) {
        (SlotStatus::Idle, SlotEvent::UploadStarted) => SlotStatus::Uploading,
        (SlotStatus::Uploading, SlotEvent::UploadSucceeded { remote_name, remote_url }) => {
            SlotStatus::Done { remote_name, remote_url }
        }
        (SlotStatus::Uploading, SlotEvent::UploadFailed { reason }) => SlotStatus::Failed { reason },
        (current, _) => current.clone(),
    }
}

/// A file picked by the user, held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// File named after the last component of `path`, MIME type guessed
    /// from its extension.
    pub fn from_path(path: &Path, bytes: impl Into<Bytes>) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();
        Self::new(name, mime_type.essence_str(), bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One file attached to a form field.
#[derive(Debug, Clone)]
pub struct UploadSlot {
    id: SlotId,
    display_name: String,
    status: SlotStatus,
    /// Original file; absent for slots seeded from already-stored names.
    source: Option<SelectedFile>,
    preview: Option<String>,
}

impl UploadSlot {
    pub(crate) fn from_file(id: SlotId, file: SelectedFile) -> Self {
        Self {
            id,
            display_name: file.name.clone(),
            status: SlotStatus::Idle,
            source: Some(file),
            preview: None,
        }
    }

    pub(crate) fn stored(id: SlotId, remote_name: String, remote_url: String) -> Self {
        Self {
            id,
            display_name: remote_name.clone(),
            status: SlotStatus::Done { remote_name, remote_url },
            source: None,
            preview: None,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn status(&self) -> &SlotStatus {
        &self.status
    }

    pub fn remote_name(&self) -> Option<&str> {
        self.status.remote_name()
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.status.remote_url()
    }

    pub fn preview_data(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub(crate) fn source(&self) -> Option<&SelectedFile> {
        self.source.as_ref()
    }

    /// Returns whether the status changed.
    pub(crate) fn apply(&mut self, event: SlotEvent) -> bool {
        let next = transition(&self.status, event);
        if next == self.status {
            return false;
        }
        self.status = next;
        true
    }

    pub(crate) fn set_preview(&mut self, data: String) {
        self.preview = Some(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(name: &str) -> SlotEvent {
        SlotEvent::UploadSucceeded {
            remote_name: name.into(),
            remote_url: format!("http://h/images/book/{}", name),
        }
    }

    #[test]
    fn test_happy_path() {
        let s = transition(&SlotStatus::Idle, SlotEvent::UploadStarted);
        assert_eq!(s, SlotStatus::Uploading);
        let s = transition(&s, done("a.png"));
        assert_eq!(s.remote_name(), Some("a.png"));
        assert_eq!(s.remote_url(), Some("http://h/images/book/a.png"));
    }

    #[test]
    fn test_failure_keeps_reason() {
        let s = transition(&SlotStatus::Uploading, SlotEvent::UploadFailed { reason: "500".into() });
        assert_eq!(s, SlotStatus::Failed { reason: "500".into() });
    }

    #[test]
    fn test_done_is_immutable() {
        let s = transition(&SlotStatus::Uploading, done("first.png"));
        let again = transition(&s, done("second.png"));
        assert_eq!(again.remote_name(), Some("first.png"));
        let failed = transition(&s, SlotEvent::UploadFailed { reason: "late".into() });
        assert!(failed.is_done());
    }

    #[test]
    fn test_completion_ignored_unless_uploading() {
        assert_eq!(transition(&SlotStatus::Idle, done("x.png")), SlotStatus::Idle);
        let failed = SlotStatus::Failed { reason: "boom".into() };
        assert_eq!(transition(&failed, done("x.png")), failed);
        assert_eq!(transition(&failed, SlotEvent::UploadStarted), failed);
    }

    #[test]
    fn test_apply_reports_ignored_events() {
        let mut slot = UploadSlot::from_file(SlotId(1), SelectedFile::new("a.png", "image/png", vec![1u8]));
        assert!(slot.apply(SlotEvent::UploadStarted));
        assert!(slot.apply(done("a.png")));
        assert!(!slot.apply(SlotEvent::UploadFailed { reason: "late".into() }));
        assert!(slot.status().is_done());
    }

    #[test]
    fn test_from_path_guesses_mime() {
        let file = SelectedFile::from_path(Path::new("covers/Hobbit.JPG"), vec![0u8; 4]);
        assert_eq!(file.name, "Hobbit.JPG");
        assert_eq!(file.mime_type, "image/jpeg");

        let webp = SelectedFile::from_path(Path::new("a.webp"), Vec::new());
        assert_eq!(webp.mime_type, "image/webp");

        let unknown = SelectedFile::from_path(Path::new("notes.zzz"), Vec::new());
        assert_eq!(unknown.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_slot_ids_order_by_selection() {
        assert!(SlotId(1) < SlotId(2));
        assert_eq!(SlotId(7).to_string(), "slot-7");
    }
}
