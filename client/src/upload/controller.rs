//! Upload slot controller.
//!
//! Owns the slots of one form field and mediates every exchange with the
//! upload endpoint. Network work is split from state: [`UploadSlotController::select`]
//! hands back a [`PendingUpload`], [`upload`] turns it into an [`UploadOutcome`]
//! without touching the controller, and [`UploadSlotController::apply`] folds
//! the outcome back in. Several uploads can therefore be in flight at once
//! while all mutation stays on the owner's `&mut`.
//!
//! Outcomes are applied iff their slot id is still present. A slot removed
//! (or replaced in single mode) while its request was in flight is never
//! resurrected. An outcome the slot's status does not accept, such as a
//! failure arriving after completion, changes nothing and raises no notice.
//!
//! No timeout is applied here: a request that never returns leaves its slot
//! in `Uploading`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use std::collections::BTreeMap;

use super::slot::{SelectedFile, SlotEvent, SlotId, SlotStatus, UploadSlot};
use crate::api::UploadBackend;
use crate::config::{ALLOWED_IMAGE_TYPES, MAX_UPLOAD_SIZE};
use crate::error::{Rejection, UploadError, UploadResult};
use crate::models::UploadDestination;
use crate::notice::Notifier;

/// Cardinality of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// At most one slot; a new selection replaces the old one.
    Single,
    /// Any number of slots, appended in selection order.
    Multi,
}

/// Current value of a field, as the owning form sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(Option<String>),
    Multi(Vec<String>),
}

/// What happened when an outcome was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Slot was updated; the owning form should pick up the new value.
    FieldChanged(FieldValue),
    /// Slot was updated but the field value did not change (e.g. failure).
    SlotUpdated,
    /// Slot exists but its status does not accept the event (e.g. already Done).
    Unchanged,
    /// Slot no longer exists; the result was dropped.
    Discarded,
}

/// An upload the caller must start.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub slot_id: SlotId,
    pub destination: UploadDestination,
    pub file: SelectedFile,
}

/// Result of one upload request, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub slot_id: SlotId,
    pub result: Result<String, String>,
}

/// Check a file against the type allow-list and the size ceiling.
///
/// Both predicates are evaluated so the user sees every problem at once.
pub fn validate_file(file: &SelectedFile) -> UploadResult<()> {
    let mut rejections = Vec::new();

    if !ALLOWED_IMAGE_TYPES.contains(&file.mime_type.as_str()) {
        rejections.push(Rejection::DisallowedType);
    }
    if file.size() >= MAX_UPLOAD_SIZE {
        rejections.push(Rejection::TooLarge);
    }

    if rejections.is_empty() {
        Ok(())
    } else {
        Err(UploadError::ValidationRejected(rejections))
    }
}

/// Controller for the slots of a single field.
#[derive(Debug)]
pub struct UploadSlotController {
    mode: SlotMode,
    destination: UploadDestination,
    image_base_url: String,
    slots: BTreeMap<SlotId, UploadSlot>,
    next_id: u64,
    notifier: Notifier,
}

impl UploadSlotController {
    pub fn new(
        mode: SlotMode,
        destination: UploadDestination,
        image_base_url: impl Into<String>,
        notifier: Notifier,
    ) -> Self {
        Self {
            mode,
            destination,
            image_base_url: image_base_url.into(),
            slots: BTreeMap::new(),
            next_id: 1,
            notifier,
        }
    }

    pub fn mode(&self) -> SlotMode {
        self.mode
    }

    pub fn destination(&self) -> UploadDestination {
        self.destination
    }

    fn allocate_id(&mut self) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Accept a file into the field and mark it uploading.
    ///
    /// Rejected files create no slot. In single mode any existing slot is
    /// dropped, whatever its status.
    pub fn select(&mut self, file: SelectedFile) -> UploadResult<PendingUpload> {
        if let Err(err) = validate_file(&file) {
            if let UploadError::ValidationRejected(ref rejections) = err {
                for rejection in rejections {
                    self.notifier.error(rejection.message());
                }
            }
            log::debug!("rejected '{}' ({} bytes, {})", file.name, file.size(), file.mime_type);
            return Err(err);
        }

        let id = self.allocate_id();
        let mut slot = UploadSlot::from_file(id, file.clone());
        slot.apply(SlotEvent::UploadStarted);

        if self.mode == SlotMode::Single {
            self.slots.clear();
        }
        self.slots.insert(id, slot);

        log::debug!("{} selected '{}' for {}", id, file.name, self.destination);

        Ok(PendingUpload {
            slot_id: id,
            destination: self.destination,
            file,
        })
    }

    /// Mark an upload as stored on the server.
    pub fn on_upload_complete(&mut self, slot_id: SlotId, remote_name: &str) -> Applied {
        let remote_url = self.destination.remote_url(&self.image_base_url, remote_name);
        let Some(slot) = self.slots.get_mut(&slot_id) else {
            log::debug!("{} completed after removal, discarding", slot_id);
            return Applied::Discarded;
        };

        let changed = slot.apply(SlotEvent::UploadSucceeded {
            remote_name: remote_name.to_string(),
            remote_url,
        });
        if !changed {
            log::debug!("{} is {:?}, ignoring completion", slot_id, slot.status());
            return Applied::Unchanged;
        }
        Applied::FieldChanged(self.field_value())
    }

    /// Mark an upload as failed and surface the reason.
    pub fn on_upload_failed(&mut self, slot_id: SlotId, reason: &str) -> Applied {
        let Some(slot) = self.slots.get_mut(&slot_id) else {
            log::debug!("{} failed after removal, discarding", slot_id);
            return Applied::Discarded;
        };

        let changed = slot.apply(SlotEvent::UploadFailed {
            reason: reason.to_string(),
        });
        if !changed {
            log::debug!("{} is {:?}, ignoring failure", slot_id, slot.status());
            return Applied::Unchanged;
        }
        self.notifier.error(reason.to_string());
        Applied::SlotUpdated
    }

    /// Route an outcome to the matching callback.
    pub fn apply(&mut self, outcome: UploadOutcome) -> Applied {
        match outcome.result {
            Ok(remote_name) => self.on_upload_complete(outcome.slot_id, &remote_name),
            Err(reason) => self.on_upload_failed(outcome.slot_id, &reason),
        }
    }

    /// Delete a slot regardless of its status. Returns whether it existed.
    pub fn remove(&mut self, slot_id: SlotId) -> bool {
        self.slots.remove(&slot_id).is_some()
    }

    /// Displayable preview of a slot, computed once.
    ///
    /// Local files become a `data:` URL; seeded slots fall back to their remote URL.
    pub fn preview(&mut self, slot_id: SlotId) -> Option<&str> {
        let slot = self.slots.get_mut(&slot_id)?;

        if slot.preview_data().is_none() {
            let data = match slot.source() {
                Some(file) => format!("data:{};base64,{}", file.mime_type, STANDARD.encode(&file.bytes)),
                None => slot.remote_url()?.to_string(),
            };
            slot.set_preview(data);
        }

        slot.preview_data()
    }

    /// Slots in presentation order (by id).
    pub fn slots(&self) -> impl Iterator<Item = &UploadSlot> {
        self.slots.values()
    }

    pub fn slot(&self, slot_id: SlotId) -> Option<&UploadSlot> {
        self.slots.get(&slot_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether any slot is still waiting on the network.
    pub fn is_uploading(&self) -> bool {
        self.slots
            .values()
            .any(|s| matches!(s.status(), SlotStatus::Uploading))
    }

    /// Remote names of finished slots, shaped by the field's mode.
    pub fn field_value(&self) -> FieldValue {
        let mut names = self.slots.values().filter_map(|s| s.remote_name().map(str::to_string));
        match self.mode {
            SlotMode::Single => FieldValue::Single(names.next()),
            SlotMode::Multi => FieldValue::Multi(names.collect()),
        }
    }

    /// Drop every slot, e.g. when the owning form closes.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Load already-stored files as finished slots (view screens).
    ///
    /// Replaces current contents. Single mode keeps only the first name.
    pub fn seed<I, S>(&mut self, stored_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slots.clear();
        for name in stored_names {
            let name = name.into();
            if name.is_empty() {
                continue;
            }
            let id = self.allocate_id();
            let url = self.destination.remote_url(&self.image_base_url, &name);
            self.slots.insert(id, UploadSlot::stored(id, name, url));
            if self.mode == SlotMode::Single {
                break;
            }
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

/// Perform one upload request. Does not touch any controller.
pub async fn upload<B: UploadBackend>(backend: &B, pending: PendingUpload) -> UploadOutcome {
    let result = backend
        .upload_file(&pending.file, pending.destination)
        .await
        .map_err(|e| e.user_message());

    if let Err(ref reason) = result {
        log::warn!("upload of '{}' failed: {}", pending.file.name, reason);
    }

    UploadOutcome {
        slot_id: pending.slot_id,
        result,
    }
}

/// Run several uploads concurrently. Outcomes come back in input order,
/// but nothing downstream depends on it.
pub async fn upload_all<B: UploadBackend>(backend: &B, pending: Vec<PendingUpload>) -> Vec<UploadOutcome> {
    join_all(pending.into_iter().map(|p| upload(backend, p))).await
}

/// Convenience: select a batch of files, upload the accepted ones
/// concurrently and apply every outcome. Returns one entry per input file.
pub async fn select_and_upload<B: UploadBackend>(
    controller: &mut UploadSlotController,
    backend: &B,
    files: Vec<SelectedFile>,
) -> Vec<UploadResult<SlotId>> {
    let mut results = Vec::with_capacity(files.len());
    let mut pending = Vec::new();

    for file in files {
        match controller.select(file) {
            Ok(p) => {
                results.push(Ok(p.slot_id));
                pending.push(p);
            }
            Err(e) => results.push(Err(e)),
        }
    }

    for outcome in upload_all(backend, pending).await {
        let slot_id = outcome.slot_id;
        let failure = outcome.result.clone().err();
        controller.apply(outcome);

        if let Some(reason) = failure {
            if let Some(entry) = results.iter_mut().find(|r| matches!(r, Ok(id) if *id == slot_id)) {
                *entry = Err(UploadError::UploadFailed(reason));
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::notice::{drain, NoticeLevel};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "http://localhost:8080";

    fn png(name: &str, size: usize) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![0u8; size])
    }

    fn controller(mode: SlotMode) -> UploadSlotController {
        UploadSlotController::new(mode, UploadDestination::Book, BASE, Notifier::new())
    }

    /// Stores every file as `stored-<n>-<name>`; names listed in `fail` are refused.
    struct FakeStore {
        counter: AtomicUsize,
        fail: Vec<&'static str>,
    }

    impl FakeStore {
        fn new() -> Self {
            Self { counter: AtomicUsize::new(0), fail: Vec::new() }
        }
    }

    impl UploadBackend for FakeStore {
        async fn upload_file(&self, file: &SelectedFile, destination: UploadDestination) -> Result<String, BackendError> {
            assert_eq!(destination, UploadDestination::Book);
            if self.fail.contains(&file.name.as_str()) {
                return Err(BackendError::Rejected { status: 500, message: "disk full".into() });
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(format!("stored-{}-{}", n, file.name))
        }
    }

    #[test]
    fn test_valid_file_yields_one_uploading_slot() {
        let mut c = controller(SlotMode::Multi);
        let pending = c.select(png("a.png", 1024)).unwrap();

        assert_eq!(c.len(), 1);
        let slot = c.slot(pending.slot_id).unwrap();
        assert_eq!(slot.status(), &SlotStatus::Uploading);
        assert_eq!(slot.display_name(), "a.png");
        assert!(slot.remote_name().is_none());
    }

    #[test]
    fn test_jpeg_accepted() {
        let mut c = controller(SlotMode::Single);
        assert!(c.select(SelectedFile::new("a.jpg", "image/jpeg", vec![1u8; 10])).is_ok());
    }

    #[test]
    fn test_size_ceiling_is_exclusive() {
        let mut c = controller(SlotMode::Multi);
        let just_under = png("under.png", (MAX_UPLOAD_SIZE - 1) as usize);
        let exact = png("exact.png", MAX_UPLOAD_SIZE as usize);

        assert!(c.select(just_under).is_ok());
        assert_eq!(
            c.select(exact).unwrap_err(),
            UploadError::ValidationRejected(vec![Rejection::TooLarge])
        );
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_disallowed_type_creates_no_slot_and_notifies() {
        let mut c = controller(SlotMode::Multi);
        let mut rx = c.notifier().subscribe();

        let gif = SelectedFile::new("a.gif", "image/gif", vec![0u8; MAX_UPLOAD_SIZE as usize + 1]);
        let err = c.select(gif).unwrap_err();

        assert_eq!(
            err,
            UploadError::ValidationRejected(vec![Rejection::DisallowedType, Rejection::TooLarge])
        );
        assert!(c.is_empty());

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
        assert_eq!(notices[0].message, "You can only upload JPG/PNG file!");
    }

    #[test]
    fn test_single_mode_replaces_regardless_of_status() {
        let mut c = controller(SlotMode::Single);

        let first = c.select(png("one.png", 10)).unwrap();
        c.on_upload_complete(first.slot_id, "one-stored.png");
        assert!(c.slot(first.slot_id).unwrap().status().is_done());

        let second = c.select(png("two.png", 10)).unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.slot(first.slot_id).is_none());
        assert_ne!(first.slot_id, second.slot_id);

        let third = c.select(png("three.png", 10)).unwrap();
        c.on_upload_failed(third.slot_id, "boom");
        c.select(png("four.png", 10)).unwrap();
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_single_mode_late_completion_of_replaced_slot_is_discarded() {
        let mut c = controller(SlotMode::Single);
        let first = c.select(png("one.png", 10)).unwrap();
        let second = c.select(png("two.png", 10)).unwrap();

        assert_eq!(c.on_upload_complete(first.slot_id, "late.png"), Applied::Discarded);
        assert_eq!(c.field_value(), FieldValue::Single(None));

        let applied = c.on_upload_complete(second.slot_id, "two-stored.png");
        assert_eq!(applied, Applied::FieldChanged(FieldValue::Single(Some("two-stored.png".into()))));
    }

    #[test]
    fn test_multi_mode_distinct_ids_and_out_of_order_completion() {
        let mut c = controller(SlotMode::Multi);
        let pending: Vec<_> = (0..4)
            .map(|i| c.select(png(&format!("{}.png", i), 10)).unwrap())
            .collect();

        assert_eq!(c.len(), 4);
        let ids: HashSet<_> = pending.iter().map(|p| p.slot_id).collect();
        assert_eq!(ids.len(), 4);

        for p in pending.iter().rev() {
            c.on_upload_complete(p.slot_id, &format!("r-{}", p.file.name));
        }

        assert_eq!(
            c.field_value(),
            FieldValue::Multi(vec![
                "r-0.png".into(),
                "r-1.png".into(),
                "r-2.png".into(),
                "r-3.png".into()
            ])
        );
        let names: Vec<_> = c.slots().map(|s| s.display_name().to_string()).collect();
        assert_eq!(names, vec!["0.png", "1.png", "2.png", "3.png"]);
    }

    #[test]
    fn test_removed_slot_is_not_resurrected() {
        let mut c = controller(SlotMode::Multi);
        let a = c.select(png("a.png", 10)).unwrap();
        let b = c.select(png("b.png", 10)).unwrap();

        assert!(c.remove(a.slot_id));
        assert_eq!(c.len(), 1);

        assert_eq!(c.on_upload_complete(a.slot_id, "a-stored.png"), Applied::Discarded);
        assert_eq!(c.on_upload_failed(a.slot_id, "late failure"), Applied::Discarded);
        assert_eq!(c.len(), 1);
        assert!(c.slot(b.slot_id).is_some());
        assert!(!c.remove(a.slot_id));
    }

    #[test]
    fn test_late_failure_after_completion_is_ignored() {
        let mut c = controller(SlotMode::Multi);
        let mut rx = c.notifier().subscribe();
        let p = c.select(png("a.png", 10)).unwrap();

        assert!(matches!(c.on_upload_complete(p.slot_id, "a-stored.png"), Applied::FieldChanged(_)));
        assert_eq!(c.on_upload_failed(p.slot_id, "late duplicate failure"), Applied::Unchanged);

        assert_eq!(c.slot(p.slot_id).unwrap().remote_name(), Some("a-stored.png"));
        assert!(drain(&mut rx).iter().all(|n| n.level != NoticeLevel::Error));
    }

    #[test]
    fn test_completion_after_failure_leaves_field_alone() {
        let mut c = controller(SlotMode::Single);
        let p = c.select(png("a.png", 10)).unwrap();
        c.on_upload_failed(p.slot_id, "Server error");

        assert_eq!(c.on_upload_complete(p.slot_id, "a-stored.png"), Applied::Unchanged);
        assert_eq!(c.field_value(), FieldValue::Single(None));
    }

    #[test]
    fn test_failure_keeps_slot_visible() {
        let mut c = controller(SlotMode::Multi);
        let mut rx = c.notifier().subscribe();
        let p = c.select(png("a.png", 10)).unwrap();

        assert_eq!(c.on_upload_failed(p.slot_id, "Server error"), Applied::SlotUpdated);
        assert_eq!(
            c.slot(p.slot_id).unwrap().status(),
            &SlotStatus::Failed { reason: "Server error".into() }
        );
        assert_eq!(drain(&mut rx).last().unwrap().message, "Server error");
    }

    #[test]
    fn test_completion_sets_remote_url() {
        let mut c = controller(SlotMode::Single);
        let p = c.select(png("cover.png", 10)).unwrap();
        c.on_upload_complete(p.slot_id, "cover-123.png");

        let slot = c.slot(p.slot_id).unwrap();
        assert_eq!(slot.remote_url(), Some("http://localhost:8080/images/book/cover-123.png"));
    }

    #[test]
    fn test_preview_is_memoized_data_url() {
        let mut c = controller(SlotMode::Multi);
        let p = c
            .select(SelectedFile::new("a.png", "image/png", b"abc".to_vec()))
            .unwrap();

        let first = c.preview(p.slot_id).unwrap().to_string();
        assert_eq!(first, "data:image/png;base64,YWJj");
        assert_eq!(c.preview(p.slot_id).unwrap(), first);
        assert_eq!(c.slot(p.slot_id).unwrap().preview_data(), Some(first.as_str()));
    }

    #[test]
    fn test_preview_of_seeded_slot_uses_remote_url() {
        let mut c = controller(SlotMode::Multi);
        c.seed(["s1.png", "s2.png"]);
        let id = c.slots().next().unwrap().id();
        assert_eq!(c.preview(id), Some("http://localhost:8080/images/book/s1.png"));
    }

    #[test]
    fn test_seed_and_reset() {
        let mut c = controller(SlotMode::Single);
        c.seed(vec!["a.png".to_string(), "b.png".to_string()]);
        assert_eq!(c.field_value(), FieldValue::Single(Some("a.png".into())));

        c.reset();
        assert!(c.is_empty());

        let p = c.select(png("new.png", 10)).unwrap();
        assert!(p.slot_id > SlotId(1));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_applied_in_reverse() {
        let store = FakeStore::new();
        let mut c = controller(SlotMode::Multi);
        let pending: Vec<_> = ["x.png", "y.png", "z.png"]
            .iter()
            .map(|n| c.select(png(n, 10)).unwrap())
            .collect();

        let mut outcomes = upload_all(&store, pending).await;
        outcomes.reverse();
        for outcome in outcomes {
            c.apply(outcome);
        }

        assert!(!c.is_uploading());
        let FieldValue::Multi(names) = c.field_value() else { panic!("multi field") };
        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("x.png"));
        assert!(names[2].ends_with("z.png"));
    }

    #[tokio::test]
    async fn test_removal_while_in_flight() {
        let store = FakeStore::new();
        let mut c = controller(SlotMode::Multi);
        let a = c.select(png("a.png", 10)).unwrap();
        let b = c.select(png("b.png", 10)).unwrap();
        let removed = a.slot_id;

        let outcomes = upload_all(&store, vec![a, b]).await;
        c.remove(removed);

        let applied: Vec<_> = outcomes.into_iter().map(|o| c.apply(o)).collect();
        assert_eq!(applied[0], Applied::Discarded);
        assert!(matches!(applied[1], Applied::FieldChanged(_)));
        assert_eq!(c.len(), 1);
    }

    #[tokio::test]
    async fn test_select_and_upload_reports_per_file() {
        let store = FakeStore { counter: AtomicUsize::new(0), fail: vec!["bad.png"] };
        let mut c = controller(SlotMode::Multi);

        let results = select_and_upload(
            &mut c,
            &store,
            vec![
                png("good.png", 10),
                SelectedFile::new("doc.pdf", "application/pdf", vec![0u8; 10]),
                png("bad.png", 10),
            ],
        )
        .await;

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(UploadError::ValidationRejected(_))));
        assert_eq!(results[2], Err(UploadError::UploadFailed("disk full".into())));
        assert_eq!(c.len(), 2);
        assert_eq!(c.field_value(), FieldValue::Multi(vec!["stored-0-good.png".into()]));
    }
}
