//! User-facing feedback for cart changes.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
}

/// One toast-style message. `kind` and `title` are the stable part; `message`
/// is display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Title of the item the notice is about.
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn added(title: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.to_string(),
            message: format!("{title} added to cart!"),
        }
    }

    pub fn removed(title: &str) -> Self {
        Self {
            kind: NoticeKind::Warning,
            title: title.to_string(),
            message: format!("{title} removed from cart!"),
        }
    }
}

/// Fire-and-forget delivery of notices. Implementations must not fail the caller.
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

impl<N> Notifier for &N
where
    N: Notifier + ?Sized,
{
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

/// Emits notices as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Success => {
                tracing::info!(kind = "success", title = %notice.title, "{}", notice.message)
            }
            NoticeKind::Warning => {
                tracing::warn!(kind = "warning", title = %notice.title, "{}", notice.message)
            }
        }
    }
}

/// Keeps every notice in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded notices (e.g. once they have been rendered).
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}
