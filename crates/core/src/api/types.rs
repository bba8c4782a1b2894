//! Request and response bodies of the ticket API.

use serde::{Deserialize, Serialize};

use crate::ticket::{Pagination, Queue, Ticket, TicketStatus};

/// Response of the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResponse {
    pub tickets: Vec<Ticket>,
    pub pagination: Pagination,
}

impl From<ListResponse> for Queue {
    fn from(response: ListResponse) -> Self {
        Queue {
            tickets: response.tickets,
            pagination: response.pagination.normalized(),
        }
    }
}

/// Body of a status change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of a new comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewComment {
    pub text: String,
    #[serde(rename = "isResolution")]
    pub is_resolution: bool,
}
