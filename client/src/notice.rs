//! User-visible notices.
//!
//! Every failure in the core degrades to a visible, recoverable message.
//! Components publish [`Notice`]s on a [`Notifier`]; whatever renders the
//! screen subscribes and shows them. Each notice is mirrored to the `log`
//! facade as well.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::NOTICE_CHANNEL_CAPACITY;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single user-visible message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Optional longer text (e.g. a backend error description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into(), description: None }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into(), description: None }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into(), description: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into(), description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Broadcasts notices to every subscriber.
///
/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a notice.
    pub fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{}", notice.message),
            NoticeLevel::Warning => log::warn!("{}", notice.message),
            NoticeLevel::Error => match &notice.description {
                Some(desc) => log::error!("{}: {}", notice.message, desc),
                None => log::error!("{}", notice.message),
            },
        }

        // No subscriber is fine
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.notify(Notice::info(msg));
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.notify(Notice::success(msg));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.notify(Notice::warning(msg));
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.notify(Notice::error(msg));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain every notice currently buffered in a receiver.
pub fn drain(receiver: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(notice) => notices.push(notice),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_notices() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.success("Import users thành công");
        notifier.notify(Notice::error("Error occurs").with_description("Email exists"));

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[1].description.as_deref(), Some("Email exists"));
    }

    #[test]
    fn test_notify_without_subscribers_does_not_fail() {
        let notifier = Notifier::default();
        notifier.info("nobody listening");
    }

    #[test]
    fn test_clones_share_channel() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.clone().warning("from clone");
        assert_eq!(drain(&mut rx)[0].message, "from clone");
    }
}
