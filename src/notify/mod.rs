//! User-facing notification channel
//!
//! Services report outcomes (settings saved, backend unreachable, tag editing
//! unavailable) as [`Notification`] values pushed through a [`Notify`]
//! implementation. The rendering layer decides how to present them; this
//! crate only defines the contract and a channel-backed default.

use std::fmt;
use tokio::sync::mpsc;

/// How prominent a notification should be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A single user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    /// Short generic headline ("Failed to fetch settings")
    pub title: String,
    /// Raw error detail or context, shown alongside the headline
    pub detail: String,
}

impl Notification {
    /// Build a success notification
    #[must_use]
    pub fn success(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// Build an error notification
    #[must_use]
    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.detail)
    }
}

/// Sink for user-facing notifications
pub trait Notify: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Channel-backed notifier feeding a single consumer (the rendering layer)
///
/// With `quiet` set, success notifications are dropped and only errors reach
/// the consumer. Dropped receivers are tolerated: a notification nobody
/// listens to is discarded, never an error.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
    quiet: bool,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the consumer
    #[must_use]
    pub fn new(quiet: bool) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, quiet }, rx)
    }
}

impl Notify for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.quiet && notification.severity == Severity::Success {
            return;
        }
        let _ = self.tx.send(notification);
    }
}

/// Notifier that discards everything (headless/scripted use)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notify for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}
