//! Types for the ticket detail view.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiError, TicketApi};
use crate::guard::EditGuard;
use crate::notify::Notifications;
use crate::refresh::RefreshScheduler;
use crate::ticket::TicketStatus;

use super::ValidationError;

/// Errors from detail view actions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetailError {
    /// The ticket does not exist (any more).
    #[error("ticket not found: {0}")]
    NotFound(String),

    /// The request failed; local state is unchanged.
    #[error("request failed: {0}")]
    Network(ApiError),

    /// Input was rejected before sending.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The view was closed.
    #[error("detail view is closed")]
    Closed,
}

impl From<ApiError> for DetailError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(id) => DetailError::NotFound(id),
            other => DetailError::Network(other),
        }
    }
}

/// Where the UI should go after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    /// Leave the detail page for the ticket list.
    BackToList,
}

/// Scroll instruction for the comment thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    LatestComment,
}

/// Result of one silent poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPollOutcome {
    /// Snapshot refreshed, no new comments.
    Updated,
    /// New comments arrived; the banner is showing and the thread is unchanged.
    NewActivity,
    /// An edit is in progress; nothing was fetched or changed.
    Suppressed,
    /// The previous poll has not returned yet.
    InFlight,
    /// The view changed while the request was in flight.
    Stale,
    /// The request failed; the snapshot is unchanged.
    Failed,
}

/// A comment being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    pub is_resolution: bool,
}

/// A status change picked but not yet submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSelection {
    pub status: TicketStatus,
    pub reason: String,
}

/// Collaborators shared by every detail view.
#[derive(Clone)]
pub struct DetailContext {
    pub api: Arc<dyn TicketApi>,
    pub guard: EditGuard,
    pub scheduler: Arc<RefreshScheduler>,
    pub notifications: Notifications,
    pub poll_interval: Duration,
}
