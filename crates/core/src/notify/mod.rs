//! Notification (toast) surface.
//!
//! The sync engine reports outcomes through the [`Notifier`] trait. The
//! in-process [`NotificationCenter`] stacks notifications, hands out ids from
//! its own sequence and retires them once their auto-dismiss delay elapses.

mod center;

pub use center::NotificationCenter;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

/// Notification severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Identifier of a displayed notification, unique per notifier instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

/// A transient banner.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub auto_dismiss: Duration,
}

/// Surface that displays transient notifications.
pub trait Notifier: Send + Sync {
    /// Display a notification; concurrent notifications stack.
    fn notify(&self, message: &str, severity: Severity, auto_dismiss: Duration) -> NotificationId;
}

/// Convenience wrapper applying the configured delay for each severity.
#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
    config: NotificationConfig,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>, config: NotificationConfig) -> Self {
        Self { notifier, config }
    }

    pub fn send(&self, message: &str, severity: Severity) -> NotificationId {
        self.notifier
            .notify(message, severity, self.config.auto_dismiss(severity))
    }

    pub fn success(&self, message: &str) -> NotificationId {
        self.send(message, Severity::Success)
    }

    pub fn info(&self, message: &str) -> NotificationId {
        self.send(message, Severity::Info)
    }

    pub fn warning(&self, message: &str) -> NotificationId {
        self.send(message, Severity::Warning)
    }

    pub fn error(&self, message: &str) -> NotificationId {
        self.send(message, Severity::Error)
    }
}
