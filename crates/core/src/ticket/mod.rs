//! Ticket data model shared by the queues, the detail view and the API client.

mod pagination;
mod types;

pub use pagination::{Pagination, Queue, QueueKind};
pub use types::{
    AuthorType, Comment, Priority, StatusChange, Ticket, TicketDetail, TicketStatus, Urgency,
};
