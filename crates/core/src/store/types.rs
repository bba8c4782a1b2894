//! Types for the ticket store.

use thiserror::Error;

use crate::api::ApiError;
use crate::ticket::{QueueKind, Ticket, TicketStatus};

/// Errors that can occur while loading or mutating queues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The list request failed; the previous snapshot is untouched.
    #[error("failed to fetch {queue} queue: {source}")]
    Network {
        queue: QueueKind,
        #[source]
        source: ApiError,
    },

    /// A newer action changed the queue while the request was in flight.
    #[error("{0} queue changed while the request was in flight")]
    Superseded(QueueKind),

    /// The ticket is not part of the queue's current snapshot.
    #[error("ticket {ticket_id} is not in the {queue} queue")]
    NotInQueue { ticket_id: String, queue: QueueKind },

    /// The ticket already has a transfer awaiting the server.
    #[error("ticket {0} already has a transfer in progress")]
    TransferPending(String),
}

/// What happened to a fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The snapshot replaced the queue.
    Applied,
    /// The queue's view is being edited; nothing changed.
    Suppressed,
    /// The queue changed after the request was sent; the response was dropped.
    Stale,
    /// A poll for this queue is still outstanding; this one was skipped.
    InFlight,
}

/// How a refresh was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Background poll: yields to edits, pending transfers and outstanding polls.
    Silent,
    /// Forced resync (after a conflict or an explicit reload).
    Forced,
}

/// Field changes applied to a ticket moved by an optimistic transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub assignee_id: Option<String>,
    pub assignee_name: Option<String>,
    pub status: Option<TicketStatus>,
}

impl TicketPatch {
    /// Patch for a ticket claimed by the given agent.
    ///
    /// Open tickets become `assigned`; any other status is kept.
    pub fn assign_to(agent_id: &str, agent_name: &str, current: TicketStatus) -> Self {
        Self {
            assignee_id: Some(agent_id.to_string()),
            assignee_name: Some(agent_name.to_string()),
            status: (current == TicketStatus::Open).then_some(TicketStatus::Assigned),
        }
    }

    pub fn apply(&self, ticket: &mut Ticket) {
        if let Some(id) = &self.assignee_id {
            ticket.assignee_id = Some(id.clone());
        }
        if let Some(name) = &self.assignee_name {
            ticket.assignee_name = Some(name.clone());
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
    }
}

/// Everything needed to settle an optimistic transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub ticket_id: String,
    pub from: QueueKind,
    pub to: QueueKind,
    /// The summary as it was before the transfer.
    pub original: Ticket,
    /// Where the summary sat in the source queue.
    pub original_index: usize,
    /// Source snapshot the summary was taken from.
    pub source_generation: u64,
}

/// How a rolled-back transfer left its source queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    /// The original summary is back at its old position.
    Restored,
    /// The source was reloaded meanwhile and must be fetched again.
    SourceReloaded,
}
