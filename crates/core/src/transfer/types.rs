//! Types for assignment transfers.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::api::ApiError;
use crate::store::StoreError;
use crate::ticket::QueueKind;

/// Errors that prevent a transfer from starting.
///
/// Failures after the optimistic step are not errors: they settle the
/// transfer as [`TransferState::RolledBack`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// Tickets can only be claimed from the unassigned pool into "mine".
    #[error("cannot transfer tickets from {from} to {to}")]
    InvalidRoute { from: QueueKind, to: QueueKind },

    /// The store refused the optimistic move.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transfer state machine: Idle -> Pending -> Committed | RolledBack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Idle,
    Pending,
    Committed,
    RolledBack,
}

impl TransferState {
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        matches!(
            (self, next),
            (TransferState::Idle, TransferState::Pending)
                | (TransferState::Pending, TransferState::Committed)
                | (TransferState::Pending, TransferState::RolledBack)
        )
    }

    /// Whether the transfer reached a final state.
    pub fn is_settled(&self) -> bool {
        matches!(self, TransferState::Committed | TransferState::RolledBack)
    }
}

/// What started the transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferTrigger {
    /// Dragged from one queue onto another.
    Drag,
    /// "Assign to me" button on an unassigned ticket.
    Button,
}

/// A single transfer and where it ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: Uuid,
    pub ticket_id: String,
    pub source: QueueKind,
    pub target: QueueKind,
    pub trigger: TransferTrigger,
    pub state: TransferState,
    /// Why the transfer was rolled back.
    pub failure: Option<ApiError>,
}

impl Transfer {
    pub fn new(
        ticket_id: impl Into<String>,
        source: QueueKind,
        target: QueueKind,
        trigger: TransferTrigger,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id: ticket_id.into(),
            source,
            target,
            trigger,
            state: TransferState::Idle,
            failure: None,
        }
    }

    pub(crate) fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transfer transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Whether the server reported that someone else holds the ticket.
    pub fn was_conflict(&self) -> bool {
        self.failure.as_ref().is_some_and(ApiError::is_conflict)
    }
}
