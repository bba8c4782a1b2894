//! Ticket API collaborator.
//!
//! This module provides the `TicketApi` trait the sync engine consumes and an
//! HTTP implementation of it. Tests use `testing::MockTicketApi` instead.

mod error;
mod http;
mod types;

pub use error::ApiError;
pub use http::HttpTicketApi;
pub use types::{ListResponse, NewComment, StatusUpdate};

use async_trait::async_trait;

use crate::filter::ListQuery;
use crate::ticket::{Priority, QueueKind, Ticket, TicketDetail};

/// Remote source of truth for tickets.
///
/// Every call carries the agent's session credentials; any non-success
/// response is reported as an [`ApiError`].
#[async_trait]
pub trait TicketApi: Send + Sync {
    /// Fetch one page of a queue.
    async fn list(&self, kind: QueueKind, query: &ListQuery) -> Result<ListResponse, ApiError>;

    /// Fetch a ticket with its comments and status history.
    async fn get_detail(&self, ticket_id: &str) -> Result<TicketDetail, ApiError>;

    /// Change a ticket's status.
    async fn update_status(&self, ticket_id: &str, update: &StatusUpdate) -> Result<(), ApiError>;

    /// Change a ticket's priority.
    async fn update_priority(&self, ticket_id: &str, priority: Priority) -> Result<(), ApiError>;

    /// Add a comment to a ticket thread.
    async fn add_comment(&self, ticket_id: &str, comment: &NewComment) -> Result<(), ApiError>;

    /// Assign the ticket to the calling agent.
    async fn assign(&self, ticket_id: &str) -> Result<Ticket, ApiError>;

    /// Claim an unassigned ticket; fails with [`ApiError::Conflict`] when
    /// another agent already holds it.
    async fn assign_to_me(&self, ticket_id: &str) -> Result<Ticket, ApiError>;

    /// Mark the ticket's customer comments as read.
    async fn mark_read(&self, ticket_id: &str) -> Result<(), ApiError>;
}
