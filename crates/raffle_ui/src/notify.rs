//! User-facing notifications.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Notification severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something worked.
    Success,
    /// Something might need attention.
    Warning,
    /// Something failed.
    Error,
}

/// Where the toast should appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// Top right corner.
    TopRight,
    /// Top left corner.
    TopLeft,
    /// Bottom right corner.
    BottomRight,
    /// Bottom left corner.
    BottomLeft,
}

/// A structured message for the notification renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub severity: Severity,
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Display hint: placement.
    pub position: Position,
    /// Display hint: icon name.
    pub icon: &'static str,
}

impl Notification {
    /// The message fired once per confirmed entry.
    #[must_use]
    pub fn transaction_complete() -> Self {
        Self {
            severity: Severity::Info,
            title: "Tx Notification".to_string(),
            message: "Transaction Complete!".to_string(),
            position: Position::TopRight,
            icon: "bell",
        }
    }
}

/// Accepts notifications for display.
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, notification: Notification);
}

/// Sink that forwards notifications over a channel to the renderer.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    sender: Sender<Notification>,
}

impl ChannelNotifier {
    /// Creates a sink and the receiver the renderer should drain.
    #[must_use]
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!("notification receiver gone, dropping notification");
        }
    }
}
