//! Edit guard: suppresses background refreshes while an agent is editing.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::ticket::QueueKind;

/// A view that owns its own refresh timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewId {
    /// The queue dashboard (unassigned, mine and closed lists).
    Dashboard,
    /// A single ticket's detail page.
    Ticket(String),
}

impl ViewId {
    /// The view a queue is displayed in. Every queue lives on the dashboard,
    /// so an edit anywhere on it holds back refreshes of all three.
    pub fn for_queue(kind: QueueKind) -> Self {
        let _ = kind;
        ViewId::Dashboard
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewId::Dashboard => f.write_str("dashboard"),
            ViewId::Ticket(id) => write!(f, "ticket:{}", id),
        }
    }
}

/// What the agent is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Composing a comment.
    Comment,
    /// A status change picked but not submitted.
    StatusSelection,
    /// Any other editable field that is open.
    Field,
}

/// Shared per-view edit flags.
///
/// A view is guarded while at least one edit is open on it. Clones share
/// the same state.
#[derive(Debug, Clone, Default)]
pub struct EditGuard {
    edits: Arc<Mutex<HashMap<ViewId, HashSet<EditKind>>>>,
}

impl EditGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an edit as started.
    pub fn begin(&self, view: &ViewId, kind: EditKind) {
        let mut edits = self.edits.lock().unwrap_or_else(PoisonError::into_inner);
        if edits.entry(view.clone()).or_default().insert(kind) {
            debug!(view = %view, ?kind, "Edit started");
        }
    }

    /// Mark an edit as submitted or cancelled.
    pub fn end(&self, view: &ViewId, kind: EditKind) {
        let mut edits = self.edits.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(kinds) = edits.get_mut(view) {
            if kinds.remove(&kind) {
                debug!(view = %view, ?kind, "Edit ended");
            }
            if kinds.is_empty() {
                edits.remove(view);
            }
        }
    }

    /// Drop every open edit of a view (e.g. when it is closed).
    pub fn clear(&self, view: &ViewId) {
        let mut edits = self.edits.lock().unwrap_or_else(PoisonError::into_inner);
        edits.remove(view);
    }

    pub fn is_active(&self, view: &ViewId) -> bool {
        let edits = self.edits.lock().unwrap_or_else(PoisonError::into_inner);
        edits.get(view).is_some_and(|kinds| !kinds.is_empty())
    }

    pub fn is_editing(&self, view: &ViewId, kind: EditKind) -> bool {
        let edits = self.edits.lock().unwrap_or_else(PoisonError::into_inner);
        edits.get(view).is_some_and(|kinds| kinds.contains(&kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_per_view() {
        let guard = EditGuard::new();
        let ticket = ViewId::Ticket("t-1".to_string());
        guard.begin(&ticket, EditKind::Comment);

        assert!(guard.is_active(&ticket));
        assert!(!guard.is_active(&ViewId::Dashboard));
        assert!(!guard.is_active(&ViewId::Ticket("t-2".to_string())));
    }

    #[test]
    fn test_guard_stays_active_until_all_edits_end() {
        let guard = EditGuard::new();
        let view = ViewId::Ticket("t-1".to_string());
        guard.begin(&view, EditKind::Comment);
        guard.begin(&view, EditKind::StatusSelection);

        guard.end(&view, EditKind::Comment);
        assert!(guard.is_active(&view));
        assert!(guard.is_editing(&view, EditKind::StatusSelection));

        guard.end(&view, EditKind::StatusSelection);
        assert!(!guard.is_active(&view));
    }

    #[test]
    fn test_clones_share_state() {
        let guard = EditGuard::new();
        let other = guard.clone();
        other.begin(&ViewId::Dashboard, EditKind::Field);
        assert!(guard.is_active(&ViewId::Dashboard));
        guard.clear(&ViewId::Dashboard);
        assert!(!other.is_active(&ViewId::Dashboard));
    }

    #[test]
    fn test_dashboard_edit_covers_every_queue() {
        let guard = EditGuard::new();
        guard.begin(&ViewId::Dashboard, EditKind::Field);
        for kind in QueueKind::ALL {
            assert!(guard.is_active(&ViewId::for_queue(kind)));
        }
    }
}
