//! Fire-and-forget user notifications ("toasts").
//!
//! Producers hold a cloneable [`Notifier`]; the front end drains the
//! receiver returned by [`Notifier::channel`]. Sends never block and never
//! fail: a full or closed channel drops the notice.

use tokio::sync::mpsc;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Neutral information.
    Info,
    /// An action completed.
    Success,
    /// Something failed; the app keeps running.
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub text: String,
}

/// Sending half of the notification surface.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notice>,
}

impl Notifier {
    /// Creates a notifier and the receiver the UI drains.
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Emits an informational notice.
    pub fn info(&self, text: impl Into<String>) {
        self.emit(NoticeLevel::Info, text.into());
    }

    /// Emits a success notice.
    pub fn success(&self, text: impl Into<String>) {
        self.emit(NoticeLevel::Success, text.into());
    }

    /// Emits an error notice.
    pub fn error(&self, text: impl Into<String>) {
        self.emit(NoticeLevel::Error, text.into());
    }

    fn emit(&self, level: NoticeLevel, text: String) {
        // Best-effort; dropped notices are only logged.
        if let Err(e) = self.tx.try_send(Notice { level, text }) {
            tracing::debug!(error = %e, "notice dropped");
        }
    }
}
