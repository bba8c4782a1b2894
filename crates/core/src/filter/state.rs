//! Filter, sort and pagination state for each queue.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use super::{Debounced, SortKey};
use crate::ticket::{QueueKind, TicketStatus};

/// Inclusive closing-date range for the closed queue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, swapping the bounds if they are reversed.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(f), Some(t)) if f > t => Self {
                from: Some(t),
                to: Some(f),
            },
            _ => Self { from, to },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Filters sent with a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    pub search: String,
    pub sort: SortKey,
    pub status: Option<TicketStatus>,
    pub date_range: DateRange,
}

/// Everything needed to fetch one page of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub filters: ListFilters,
}

impl ListQuery {
    /// First page of a queue with default filters.
    pub fn first_page(kind: QueueKind, page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            filters: ListFilters {
                search: String::new(),
                sort: SortKey::default_for(kind),
                status: None,
                date_range: DateRange::default(),
            },
        }
    }
}

/// Filter state of a single queue.
#[derive(Debug, Clone)]
pub struct QueueFilterState {
    kind: QueueKind,
    search: Debounced<String>,
    sort: SortKey,
    status: Option<TicketStatus>,
    date_range: DateRange,
    page: u32,
    page_size: u32,
}

impl QueueFilterState {
    pub fn new(kind: QueueKind, page_size: u32, debounce: Duration) -> Self {
        Self {
            kind,
            search: Debounced::new(String::new(), debounce),
            sort: SortKey::default_for(kind),
            status: None,
            date_range: DateRange::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Record a keystroke; returns the instant the search would commit.
    pub fn input_search(&mut self, text: impl Into<String>, now: Instant) -> Instant {
        self.search.input(text.into(), now)
    }

    /// Commit the pending search if its delay elapsed.
    ///
    /// Returns true when the committed text changed; the queue then goes
    /// back to page 1.
    pub fn commit_search_if_due(&mut self, now: Instant) -> bool {
        if self.search.commit_due(now).is_some() {
            self.page = 1;
            debug!(queue = %self.kind, search = %self.search.committed(), "Search committed");
            true
        } else {
            false
        }
    }

    /// Apply a search value without debouncing (used when restoring state).
    pub fn set_search_immediate(&mut self, text: impl Into<String>) {
        self.search.set_immediate(text.into());
    }

    /// Change the sort key. Keys the queue does not offer are ignored.
    pub fn set_sort(&mut self, sort: SortKey) -> bool {
        if !sort.is_allowed_for(self.kind) {
            debug!(queue = %self.kind, sort = %sort, "Ignoring sort key not offered by queue");
            return false;
        }
        if self.sort == sort {
            return false;
        }
        self.sort = sort;
        self.page = 1;
        true
    }

    /// Change the status filter. Only the mine and closed queues filter by
    /// status, each over the statuses it can hold.
    pub fn set_status(&mut self, status: Option<TicketStatus>) -> bool {
        if status.is_some_and(|s| !Self::status_allowed(self.kind, s)) {
            debug!(queue = %self.kind, status = ?status, "Ignoring status filter not offered by queue");
            return false;
        }
        if self.kind == QueueKind::Unassigned || self.status == status {
            return false;
        }
        self.status = status;
        self.page = 1;
        true
    }

    /// Whether `status` is a valid filter value for the queue.
    pub fn status_allowed(kind: QueueKind, status: TicketStatus) -> bool {
        match kind {
            QueueKind::Unassigned => false,
            QueueKind::Mine => !status.is_terminal(),
            QueueKind::Closed => status.is_terminal(),
        }
    }

    /// Change the closing-date range. Only the closed queue has one.
    pub fn set_date_range(&mut self, range: DateRange) -> bool {
        if self.kind != QueueKind::Closed || self.date_range == range {
            return false;
        }
        self.date_range = range;
        self.page = 1;
        true
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.page == page {
            return false;
        }
        self.page = page;
        true
    }

    /// Change the page size; always returns to page 1.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size && self.page == 1 {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    pub fn search_input(&self) -> &str {
        self.search.raw()
    }

    pub fn search(&self) -> &str {
        self.search.committed()
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn status(&self) -> Option<TicketStatus> {
        self.status
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The query the queue should currently be fetched with.
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            page_size: self.page_size,
            filters: ListFilters {
                search: self.search.committed().clone(),
                sort: self.sort,
                status: self.status,
                date_range: self.date_range,
            },
        }
    }
}

/// Filter state of all three queues.
#[derive(Debug, Clone)]
pub struct FilterState {
    unassigned: QueueFilterState,
    mine: QueueFilterState,
    closed: QueueFilterState,
}

impl FilterState {
    pub fn new(page_size: u32, debounce: Duration) -> Self {
        Self {
            unassigned: QueueFilterState::new(QueueKind::Unassigned, page_size, debounce),
            mine: QueueFilterState::new(QueueKind::Mine, page_size, debounce),
            closed: QueueFilterState::new(QueueKind::Closed, page_size, debounce),
        }
    }

    pub fn get(&self, kind: QueueKind) -> &QueueFilterState {
        match kind {
            QueueKind::Unassigned => &self.unassigned,
            QueueKind::Mine => &self.mine,
            QueueKind::Closed => &self.closed,
        }
    }

    pub fn get_mut(&mut self, kind: QueueKind) -> &mut QueueFilterState {
        match kind {
            QueueKind::Unassigned => &mut self.unassigned,
            QueueKind::Mine => &mut self.mine,
            QueueKind::Closed => &mut self.closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(kind: QueueKind) -> QueueFilterState {
        QueueFilterState::new(kind, 25, Duration::from_millis(500))
    }

    #[test]
    fn test_non_debounced_changes_reset_page() {
        let mut mine = state(QueueKind::Mine);
        mine.set_page(4);
        assert!(mine.set_sort(SortKey::Status));
        assert_eq!(mine.page(), 1);

        mine.set_page(3);
        assert!(mine.set_status(Some(TicketStatus::InProgress)));
        assert_eq!(mine.page(), 1);

        mine.set_page(2);
        assert!(mine.set_page_size(50));
        assert_eq!(mine.page(), 1);
        assert_eq!(mine.page_size(), 50);
    }

    #[test]
    fn test_search_commit_resets_page() {
        let mut unassigned = state(QueueKind::Unassigned);
        unassigned.set_page(3);
        let start = Instant::now();
        let deadline = unassigned.input_search("printer", start);

        assert!(!unassigned.commit_search_if_due(start + Duration::from_millis(499)));
        assert_eq!(unassigned.page(), 3);
        assert_eq!(unassigned.search(), "");
        assert_eq!(unassigned.search_input(), "printer");

        assert!(unassigned.commit_search_if_due(deadline));
        assert_eq!(unassigned.page(), 1);
        assert_eq!(unassigned.list_query().filters.search, "printer");
    }

    #[test]
    fn test_queue_specific_filters_are_ignored_elsewhere() {
        let mut unassigned = state(QueueKind::Unassigned);
        assert!(!unassigned.set_status(Some(TicketStatus::Open)));
        assert!(!unassigned.set_sort(SortKey::ClosedAt));

        let mut mine = state(QueueKind::Mine);
        let day = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert!(!mine.set_date_range(DateRange::new(day, None)));

        assert!(!mine.set_status(Some(TicketStatus::Resolved)));

        let mut closed = state(QueueKind::Closed);
        closed.set_page(2);
        assert!(closed.set_date_range(DateRange::new(day, None)));
        assert_eq!(closed.page(), 1);
        assert!(!closed.set_status(Some(TicketStatus::InProgress)));
        assert!(closed.set_status(Some(TicketStatus::Cancelled)));
    }

    #[test]
    fn test_date_range_swaps_reversed_bounds() {
        let early = NaiveDate::from_ymd_opt(2024, 1, 1);
        let late = NaiveDate::from_ymd_opt(2024, 2, 1);
        let range = DateRange::new(late, early);
        assert_eq!(range.from, early);
        assert_eq!(range.to, late);
        assert!(DateRange::default().is_empty());
    }

    #[test]
    fn test_page_is_never_zero() {
        let mut closed = state(QueueKind::Closed);
        closed.set_page(0);
        assert_eq!(closed.page(), 1);
        closed.set_page_size(0);
        assert_eq!(closed.page_size(), 1);
    }
}
