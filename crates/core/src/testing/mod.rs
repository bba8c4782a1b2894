//! Testing utilities and mock implementations.
//!
//! Mock implementations of the external seams (ticket API, notifier and
//! location bar) so that stores, transfers and views can be exercised
//! without a server or a UI.
//!
//! # Example
//!
//! ```rust,ignore
//! use triage_core::testing::{fixtures, MockTicketApi, RecordingNotifier};
//!
//! let api = MockTicketApi::new();
//! api.set_queue(QueueKind::Unassigned, vec![fixtures::ticket("t-1")]);
//! api.pause_assignments();
//! // ... start a transfer, assert the optimistic state ...
//! api.resume_assignments();
//! ```

mod memory_location;
mod mock_api;
mod recording_notifier;

pub use memory_location::MemoryLocation;
pub use mock_api::MockTicketApi;
pub use recording_notifier::RecordingNotifier;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::config::{
        AgentConfig, ApiConfig, Config, FilterConfig, NotificationConfig, RefreshConfig,
    };
    use crate::ticket::{
        AuthorType, Comment, Pagination, Priority, Queue, Ticket, TicketDetail, TicketStatus,
    };

    /// Id of the agent used by [`agent`].
    pub const AGENT_ID: &str = "agent-7";

    /// Display name the mock server reports for [`AGENT_ID`].
    pub const AGENT_SERVER_NAME: &str = "Grace Hopper";

    /// A fixed instant `minutes` after the fixture epoch.
    pub fn at_minute(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_default()
            + Duration::minutes(minutes)
    }

    /// An open, unassigned ticket with normal priority.
    ///
    /// Every fixture ticket shares the same creation time so sorts fall back
    /// to input order.
    pub fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            number: id.bytes().map(u64::from).sum::<u64>() + 1000,
            subject: format!("Ticket {}", id),
            status: TicketStatus::Open,
            priority: Priority::Normal,
            urgency: None,
            customer_name: Some(format!("Customer {}", id)),
            customer_phone: None,
            customer_email: Some(format!("{}@customer.example", id)),
            assignee_id: None,
            assignee_name: None,
            created_at: at_minute(0),
            updated_at: None,
            closed_at: None,
            unread_customer_comments: 0,
        }
    }

    pub fn ticket_with_priority(id: &str, priority: Priority) -> Ticket {
        Ticket {
            priority,
            ..ticket(id)
        }
    }

    /// A single-page queue holding `tickets`.
    pub fn queue(tickets: Vec<Ticket>) -> Queue {
        let total = tickets.len() as u64;
        Queue {
            tickets,
            pagination: Pagination::new(1, 25, total),
        }
    }

    /// A detail with `comments` customer comments, one minute apart.
    pub fn detail(id: &str, comments: usize) -> TicketDetail {
        TicketDetail {
            ticket: ticket(id),
            comments: (0..comments)
                .map(|i| Comment {
                    id: format!("{}-c{}", id, i + 1),
                    author_name: format!("Customer {}", id),
                    author_type: AuthorType::Customer,
                    text: format!("Customer message number {}", i + 1),
                    is_resolution: false,
                    created_at: at_minute(i as i64 + 1),
                })
                .collect(),
            status_history: Vec::new(),
        }
    }

    pub fn agent() -> AgentConfig {
        AgentConfig {
            id: AGENT_ID.to_string(),
            name: "Grace".to_string(),
        }
    }

    /// A complete configuration with default timings.
    pub fn config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:8080/api".to_string(),
                session_token: None,
                timeout_secs: 30,
            },
            agent: agent(),
            refresh: RefreshConfig::default(),
            filters: FilterConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}
