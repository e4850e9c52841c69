//! Notification seam
//!
//! The monitor decides *that* a notification fires and with what data; a
//! `Notifier` implementation turns it into a message. Countdown captions are
//! re-rendered here and pushed through `edit_caption`.

use crate::state::SourceKind;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

static NEXT_NOTIFICATION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LOG_MESSAGE: AtomicU64 = AtomicU64::new(1);

/// Errors reported by a notification sender
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification rejected: {0}")]
    Rejected(String),

    #[error("message handle {0} is no longer valid")]
    InvalidHandle(MessageHandle),
}

/// Opaque reference to a sent message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub String);

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data handed to the sender for one message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub source_id: String,
    pub kind: SourceKind,
    /// Values shown, newest first
    pub entries: Vec<String>,
    pub is_initial_run: bool,
    /// One of several per-entry messages for the same change
    pub single_mode: bool,
    pub flag_url: Option<String>,
}

/// A sent notification, kept while its countdown may still run
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationState {
    pub id: u64,
    pub notification: Notification,
    /// Set once the sender has accepted the message
    pub message_handle: Option<MessageHandle>,
}

impl NotificationState {
    pub fn new(notification: Notification) -> Self {
        Self {
            id: NEXT_NOTIFICATION_ID.fetch_add(1, Ordering::Relaxed),
            notification,
            message_handle: None,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.notification.source_id
    }
}

/// Sends notifications and edits their captions
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a notification and returns a handle to the sent message
    async fn notify(&self, notification: &Notification) -> Result<MessageHandle, NotifyError>;

    /// Replaces the caption of a previously sent message
    async fn edit_caption(&self, handle: &MessageHandle, caption: &str) -> Result<(), NotifyError>;
}

/// Formats seconds as `HH hrs : MM min : SS sec`, omitting leading zero units
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{:02} hrs : ", hours));
    }
    if minutes > 0 || hours > 0 {
        out.push_str(&format!("{:02} min : ", minutes));
    }
    out.push_str(&format!("{:02} sec", seconds));
    out
}

/// Renders a plain caption for a notification
///
/// With `remaining` set, a countdown line is appended.
pub fn render_caption(notification: &Notification, remaining: Option<Duration>) -> String {
    let mut caption = match (notification.kind, notification.entries.as_slice()) {
        (_, [only]) => format!("New number added: {}", only),
        (_, []) => "New number added".to_string(),
        (SourceKind::Single, [head, ..]) => format!("New number added: {}", head),
        (SourceKind::Multiple, entries) => format!("New numbers added: found {}", entries.len()),
    };

    if let Some(remaining) = remaining {
        caption.push_str("\nNext notification in: ");
        caption.push_str(&format_time(remaining.as_secs()));
    }
    caption
}

/// Sender that writes notifications to the log
///
/// Used by the binary when no chat integration is wired in.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<MessageHandle, NotifyError> {
        let handle = MessageHandle(format!(
            "log-{}",
            NEXT_LOG_MESSAGE.fetch_add(1, Ordering::Relaxed)
        ));
        tracing::info!(
            source = %notification.source_id,
            kind = %notification.kind,
            initial = notification.is_initial_run,
            entries = ?notification.entries,
            flag = notification.flag_url.as_deref().unwrap_or("-"),
            handle = %handle,
            "{}",
            render_caption(notification, None)
        );
        Ok(handle)
    }

    async fn edit_caption(&self, handle: &MessageHandle, caption: &str) -> Result<(), NotifyError> {
        tracing::debug!(handle = %handle, caption, "caption updated");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every call; can be told to reject sends or edits
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub edits: Mutex<Vec<(MessageHandle, String)>>,
        pub reject_sends: bool,
        pub reject_edits: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<MessageHandle, NotifyError> {
            if self.reject_sends {
                return Err(NotifyError::Rejected("test".to_string()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(notification.clone());
            Ok(MessageHandle(format!("msg-{}", sent.len())))
        }

        async fn edit_caption(&self, handle: &MessageHandle, caption: &str) -> Result<(), NotifyError> {
            if self.reject_edits {
                return Err(NotifyError::InvalidHandle(handle.clone()));
            }
            self.edits
                .lock()
                .unwrap()
                .push((handle.clone(), caption.to_string()));
            Ok(())
        }
    }
}
