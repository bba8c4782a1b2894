//! Queues and their pagination descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Ticket;

/// The three ticket collections an agent works with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    /// Pool of tickets nobody has claimed yet.
    Unassigned,
    /// Tickets assigned to the acting agent.
    Mine,
    /// Historical resolved/closed/cancelled tickets.
    Closed,
}

impl QueueKind {
    pub const ALL: [QueueKind; 3] = [QueueKind::Unassigned, QueueKind::Mine, QueueKind::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueKind::Unassigned => "unassigned",
            QueueKind::Mine => "mine",
            QueueKind::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    /// Whether the queue is one of the two personal working queues.
    pub fn is_personal(&self) -> bool {
        matches!(self, QueueKind::Unassigned | QueueKind::Mine)
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination descriptor as returned by the list endpoint.
///
/// `page` and `page_size` are always at least 1. `total_pages` is derived
/// from the other fields and recomputed on every change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total_count: u64) -> Self {
        let mut pagination = Self {
            page: page.max(1),
            page_size: page_size.max(1),
            total_count,
            total_pages: 0,
        };
        pagination.recompute();
        pagination
    }

    /// An empty first page.
    pub fn empty(page_size: u32) -> Self {
        Self::new(1, page_size, 0)
    }

    /// Copy with a new page size; resets to the first page.
    pub fn with_page_size(self, page_size: u32) -> Self {
        Self::new(1, page_size, self.total_count)
    }

    /// Copy with a new page number (clamped to at least 1).
    pub fn with_page(self, page: u32) -> Self {
        Self::new(page, self.page_size, self.total_count)
    }

    /// Account for a ticket entering the queue.
    pub fn increment(&mut self) {
        self.total_count += 1;
        self.recompute();
    }

    /// Account for a ticket leaving the queue.
    pub fn decrement(&mut self) {
        self.total_count = self.total_count.saturating_sub(1);
        self.recompute();
    }

    /// Normalize a descriptor received from the server.
    pub fn normalized(self) -> Self {
        Self::new(self.page, self.page_size, self.total_count)
    }

    fn recompute(&mut self) {
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        self.total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
    }
}

/// An ordered page of ticket summaries plus its pagination descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Queue {
    pub tickets: Vec<Ticket>,
    pub pagination: Pagination,
}

impl Queue {
    pub fn empty(page_size: u32) -> Self {
        Self {
            tickets: Vec::new(),
            pagination: Pagination::empty(page_size),
        }
    }

    pub fn contains(&self, ticket_id: &str) -> bool {
        self.position(ticket_id).is_some()
    }

    pub fn position(&self, ticket_id: &str) -> Option<usize> {
        self.tickets.iter().position(|t| t.id == ticket_id)
    }

    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == ticket_id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_recompute_on_page_size_change() {
        let pagination = Pagination::new(2, 25, 30);
        assert_eq!(pagination.total_pages, 2);
        assert_eq!(pagination.page, 2);

        let resized = pagination.with_page_size(50);
        assert_eq!(resized.page, 1);
        assert_eq!(resized.page_size, 50);
        assert_eq!(resized.total_pages, 1);
    }

    #[test]
    fn test_page_and_size_are_positive() {
        let pagination = Pagination::new(0, 0, 5);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.page_size, 1);
        assert_eq!(pagination.total_pages, 5);
    }

    #[test]
    fn test_empty_queue_has_zero_pages() {
        let pagination = Pagination::empty(25);
        assert_eq!(pagination.total_pages, 0);

        let mut pagination = pagination;
        pagination.increment();
        assert_eq!(pagination.total_count, 1);
        assert_eq!(pagination.total_pages, 1);

        pagination.decrement();
        pagination.decrement();
        assert_eq!(pagination.total_count, 0);
        assert_eq!(pagination.total_pages, 0);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"page":3,"pageSize":10,"totalCount":41,"totalPages":99}"#;
        let pagination: Pagination = serde_json::from_str(json).unwrap();
        assert_eq!(pagination.page_size, 10);
        assert_eq!(pagination.normalized().total_pages, 5);
    }

    #[test]
    fn test_queue_kind_parse() {
        assert_eq!(QueueKind::parse("mine"), Some(QueueKind::Mine));
        assert_eq!(QueueKind::parse("other"), None);
        assert!(QueueKind::Unassigned.is_personal());
        assert!(!QueueKind::Closed.is_personal());
    }
}
