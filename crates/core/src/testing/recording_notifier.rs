//! Notifier that records every notification.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::notify::{Notification, NotificationId, Notifier, Severity};

/// Records notifications for assertions instead of displaying them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    recorded: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first.
    pub fn recorded(&self) -> Vec<Notification> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_severity(&self) -> Option<Severity> {
        self.recorded().last().map(|n| n.severity)
    }

    pub fn last_message(&self) -> Option<String> {
        self.recorded().last().map(|n| n.message.clone())
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.recorded()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity, auto_dismiss: Duration) -> NotificationId {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        let id = NotificationId(recorded.len() as u64 + 1);
        recorded.push(Notification {
            id,
            message: message.to_string(),
            severity,
            auto_dismiss,
        });
        id
    }
}
