//! Client-side sort comparators for queue snapshots.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ticket::{QueueKind, Ticket};

/// Sort key selectable per queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Priority rank, oldest first within a rank.
    Priority,
    /// Newest first.
    Created,
    /// Customer name A-Z.
    Customer,
    /// Most recently updated first.
    LastActivity,
    /// Status name A-Z.
    Status,
    /// Most recently closed first.
    ClosedAt,
}

impl SortKey {
    const UNASSIGNED: [SortKey; 3] = [SortKey::Priority, SortKey::Created, SortKey::Customer];
    const MINE: [SortKey; 3] = [SortKey::LastActivity, SortKey::Status, SortKey::Priority];
    const CLOSED: [SortKey; 2] = [SortKey::ClosedAt, SortKey::Priority];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Created => "created",
            SortKey::Customer => "customer",
            SortKey::LastActivity => "last_activity",
            SortKey::Status => "status",
            SortKey::ClosedAt => "closed_at",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [
            SortKey::Priority,
            SortKey::Created,
            SortKey::Customer,
            SortKey::LastActivity,
            SortKey::Status,
            SortKey::ClosedAt,
        ]
        .into_iter()
        .find(|k| k.as_str() == value)
    }

    /// Default sort for a queue.
    pub fn default_for(kind: QueueKind) -> Self {
        Self::allowed_for(kind)[0]
    }

    /// Sort keys a queue offers.
    pub fn allowed_for(kind: QueueKind) -> &'static [SortKey] {
        match kind {
            QueueKind::Unassigned => &Self::UNASSIGNED,
            QueueKind::Mine => &Self::MINE,
            QueueKind::Closed => &Self::CLOSED,
        }
    }

    pub fn is_allowed_for(&self, kind: QueueKind) -> bool {
        Self::allowed_for(kind).contains(self)
    }

    /// Compare two tickets under this key.
    pub fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        match self {
            SortKey::Priority => a
                .priority
                .rank()
                .cmp(&b.priority.rank())
                .then_with(|| a.created_at.cmp(&b.created_at)),
            SortKey::Created => b.created_at.cmp(&a.created_at),
            SortKey::Customer => {
                let a_name = a.customer_name.as_deref().unwrap_or("");
                let b_name = b.customer_name.as_deref().unwrap_or("");
                a_name.cmp(b_name)
            }
            SortKey::LastActivity => b.last_activity().cmp(&a.last_activity()),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::ClosedAt => {
                let a_closed = a.closed_at.unwrap_or_else(|| a.last_activity());
                let b_closed = b.closed_at.unwrap_or_else(|| b.last_activity());
                b_closed.cmp(&a_closed)
            }
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable in-place sort of a snapshot.
pub fn sort_tickets(tickets: &mut [Ticket], key: SortKey) {
    tickets.sort_by(|a, b| key.compare(a, b));
}
