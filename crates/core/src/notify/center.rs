use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use super::{Notification, NotificationId, Notifier, Severity};

struct Entry {
    notification: Notification,
    expires_at: Instant,
}

struct CenterState {
    next_id: u64,
    entries: Vec<Entry>,
}

/// In-process notification stack.
pub struct NotificationCenter {
    state: Mutex<CenterState>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CenterState {
                next_id: 1,
                entries: Vec::new(),
            }),
        }
    }

    /// Notifications still on screen, oldest first. Expired ones are retired.
    pub fn active(&self) -> Vec<Notification> {
        self.retire_expired(Instant::now());
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .entries
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    /// Dismiss a notification before it expires.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.entries.len();
        state.entries.retain(|e| e.notification.id != id);
        state.entries.len() != before
    }

    /// Drop notifications whose delay elapsed at `now`.
    pub fn retire_expired(&self, now: Instant) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.entries.len();
        state.entries.retain(|e| e.expires_at > now);
        before - state.entries.len()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, message: &str, severity: Severity, auto_dismiss: Duration) -> NotificationId {
        match severity {
            Severity::Error => error!(%severity, "{}", message),
            Severity::Warning => warn!(%severity, "{}", message),
            Severity::Success | Severity::Info => info!(%severity, "{}", message),
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let id = NotificationId(state.next_id);
        state.next_id += 1;
        state.entries.push(Entry {
            notification: Notification {
                id,
                message: message.to_string(),
                severity,
                auto_dismiss,
            },
            expires_at: Instant::now() + auto_dismiss,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notifications_stack_and_expire() {
        let center = NotificationCenter::new();
        let first = center.notify("saved", Severity::Success, Duration::from_millis(100));
        let second = center.notify("oops", Severity::Error, Duration::from_millis(300));
        assert_ne!(first, second);
        assert_eq!(center.active().len(), 2);

        tokio::time::advance(Duration::from_millis(150)).await;
        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second);

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(center.active().is_empty());
    }

    #[test]
    fn test_ids_are_scoped_to_the_center() {
        let a = NotificationCenter::new();
        let b = NotificationCenter::new();
        let delay = Duration::from_secs(5);
        assert_eq!(a.notify("x", Severity::Info, delay), NotificationId(1));
        assert_eq!(a.notify("y", Severity::Info, delay), NotificationId(2));
        assert_eq!(b.notify("z", Severity::Info, delay), NotificationId(1));
    }

    #[test]
    fn test_dismiss() {
        let center = NotificationCenter::new();
        let id = center.notify("claimed", Severity::Warning, Duration::from_secs(5));
        assert!(center.dismiss(id));
        assert!(!center.dismiss(id));
        assert!(center.active().is_empty());
    }
}
