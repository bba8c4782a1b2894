//! Core ticket data types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Assigned,
    InProgress,
    WaitingCustomer,
    Resolved,
    Closed,
    Cancelled,
}

impl TicketStatus {
    /// All statuses in workflow order.
    pub const ALL: [TicketStatus; 7] = [
        TicketStatus::Open,
        TicketStatus::Assigned,
        TicketStatus::InProgress,
        TicketStatus::WaitingCustomer,
        TicketStatus::Resolved,
        TicketStatus::Closed,
        TicketStatus::Cancelled,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Assigned => "assigned",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::WaitingCustomer => "waiting_customer",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Whether a ticket with this status belongs to the closed history.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Resolved | TicketStatus::Closed | TicketStatus::Cancelled
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket priority. Urgent tickets sort first.
///
/// Values the server sends that this client does not know deserialize to
/// [`Priority::Unknown`], which ranks after every known priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
    #[serde(other)]
    Unknown,
}

impl Priority {
    /// Sort rank: urgent 0, high 1, normal 2, low 3, unknown last.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
            Priority::Unknown => u8::MAX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
            Priority::Unknown => "unknown",
        }
    }

    /// Parse a known priority name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "urgent" => Some(Priority::Urgent),
            "high" => Some(Priority::High),
            "normal" => Some(Priority::Normal),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer-reported urgency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

/// Who wrote a comment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorType {
    Customer,
    Tech,
    System,
}

// ============================================================================
// Ticket summary
// ============================================================================

/// Ticket summary as held in a queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: String,
    /// Human-facing ticket number.
    pub number: u64,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub assignee_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Customer comments the assignee has not read yet.
    #[serde(default)]
    pub unread_customer_comments: u32,
}

impl Ticket {
    /// Timestamp of the last activity on the ticket.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Whether the ticket is assigned to the given agent.
    pub fn is_assigned_to(&self, agent_id: &str) -> bool {
        self.assignee_id.as_deref() == Some(agent_id)
    }
}

// ============================================================================
// Ticket detail
// ============================================================================

/// A comment on a ticket thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    pub author_type: AuthorType,
    pub text: String,
    #[serde(default)]
    pub is_resolution: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry of the status history log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    #[serde(default)]
    pub from_status: Option<TicketStatus>,
    pub to_status: TicketStatus,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Full ticket loaded on demand by the detail view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
}

impl TicketDetail {
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// The most recent comment, if any.
    pub fn latest_comment(&self) -> Option<&Comment> {
        self.comments.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_total_order() {
        assert!(Priority::Urgent < Priority::High);
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Low);
        assert!(Priority::Low < Priority::Unknown);
    }

    #[test]
    fn test_unknown_priority_deserializes() {
        let p: Priority = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(p, Priority::Unknown);
        let p: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(p, Priority::Urgent);
    }

    #[test]
    fn test_status_parse_and_terminal() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("bogus"), None);
        assert!(TicketStatus::Resolved.is_terminal());
        assert!(TicketStatus::Cancelled.is_terminal());
        assert!(!TicketStatus::WaitingCustomer.is_terminal());
    }

    #[test]
    fn test_detail_deserializes_flattened_summary() {
        let json = r#"{
            "id": "t-1",
            "number": 1042,
            "subject": "Printer on fire",
            "status": "in_progress",
            "priority": "high",
            "customer_name": "Ada",
            "assignee_id": "agent-7",
            "assignee_name": "Grace",
            "created_at": "2024-05-01T10:00:00Z",
            "comments": [{
                "id": "c-1",
                "author_name": "Ada",
                "author_type": "customer",
                "text": "It is still burning",
                "created_at": "2024-05-01T10:05:00Z"
            }],
            "status_history": [{
                "from_status": "open",
                "to_status": "in_progress",
                "changed_by": "Grace",
                "changed_at": "2024-05-01T10:06:00Z"
            }]
        }"#;

        let detail: TicketDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.ticket.number, 1042);
        assert_eq!(detail.ticket.status, TicketStatus::InProgress);
        assert_eq!(detail.comment_count(), 1);
        assert!(!detail.comments[0].is_resolution);
        assert_eq!(detail.status_history[0].from_status, Some(TicketStatus::Open));
        assert_eq!(detail.ticket.unread_customer_comments, 0);
        assert_eq!(detail.ticket.last_activity(), detail.ticket.created_at);
    }
}
