//! Dashboard state mirrored into the location's query string.
//!
//! Every queue's page, page size, committed search, sort and filters are
//! written under a per-queue key prefix (`u_`, `m_`, `c_`) so that a reload or
//! a shared link restores the same view. Default values are omitted.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::filter::{DateRange, FilterState, QueueFilterState, SortKey};
use crate::ticket::{QueueKind, TicketStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Dashboard tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    /// Unassigned and personal queues side by side.
    #[default]
    Active,
    /// Closed history.
    Closed,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Active => "active",
            Tab::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Tab::Active),
            "closed" => Some(Tab::Closed),
            _ => None,
        }
    }

    /// Queues shown on the tab.
    pub fn kinds(&self) -> &'static [QueueKind] {
        match self {
            Tab::Active => &[QueueKind::Unassigned, QueueKind::Mine],
            Tab::Closed => &[QueueKind::Closed],
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The address bar of the hosting shell.
pub trait LocationBar: Send + Sync {
    /// Current query string, with or without the leading `?`.
    fn query(&self) -> String;

    /// Replace the query string in place, without navigating.
    fn replace_query(&self, query: &str);
}

/// URL-visible state of one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueUrlState {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub sort: SortKey,
    pub status: Option<TicketStatus>,
    pub date_range: DateRange,
}

impl QueueUrlState {
    pub fn defaults(kind: QueueKind, page_size: u32) -> Self {
        Self {
            page: 1,
            limit: page_size.max(1),
            search: String::new(),
            sort: SortKey::default_for(kind),
            status: None,
            date_range: DateRange::default(),
        }
    }

    fn from_filter(filter: &QueueFilterState) -> Self {
        Self {
            page: filter.page(),
            limit: filter.page_size(),
            search: filter.search().to_string(),
            sort: filter.sort(),
            status: filter.status(),
            date_range: filter.date_range(),
        }
    }

    fn apply_to(&self, filter: &mut QueueFilterState) {
        filter.set_search_immediate(self.search.clone());
        filter.set_sort(self.sort);
        filter.set_status(self.status);
        filter.set_date_range(self.date_range);
        filter.set_page_size(self.limit);
        filter.set_page(self.page);
    }
}

/// URL-visible state of the whole dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardUrlState {
    pub tab: Tab,
    pub unassigned: QueueUrlState,
    pub mine: QueueUrlState,
    pub closed: QueueUrlState,
}

fn prefix(kind: QueueKind) -> &'static str {
    match kind {
        QueueKind::Unassigned => "u_",
        QueueKind::Mine => "m_",
        QueueKind::Closed => "c_",
    }
}

fn decode(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|s| s.into_owned())
}

impl DashboardUrlState {
    pub fn defaults(page_size: u32) -> Self {
        Self {
            tab: Tab::default(),
            unassigned: QueueUrlState::defaults(QueueKind::Unassigned, page_size),
            mine: QueueUrlState::defaults(QueueKind::Mine, page_size),
            closed: QueueUrlState::defaults(QueueKind::Closed, page_size),
        }
    }

    pub fn queue(&self, kind: QueueKind) -> &QueueUrlState {
        match kind {
            QueueKind::Unassigned => &self.unassigned,
            QueueKind::Mine => &self.mine,
            QueueKind::Closed => &self.closed,
        }
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut QueueUrlState {
        match kind {
            QueueKind::Unassigned => &mut self.unassigned,
            QueueKind::Mine => &mut self.mine,
            QueueKind::Closed => &mut self.closed,
        }
    }

    /// Parse a query string. Unknown keys are ignored and invalid values keep
    /// their defaults.
    pub fn parse(query: &str, page_size: u32, max_page_size: u32) -> Self {
        let mut state = Self::defaults(page_size);
        let mut from = None;
        let mut to = None;

        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let (Some(key), Some(value)) = (decode(raw_key), decode(raw_value)) else {
                debug!(pair, "Skipping undecodable query pair");
                continue;
            };

            if key == "tab" {
                if let Some(tab) = Tab::parse(&value) {
                    state.tab = tab;
                }
                continue;
            }

            let Some((kind, field)) = QueueKind::ALL
                .into_iter()
                .find_map(|k| key.strip_prefix(prefix(k)).map(|f| (k, f)))
            else {
                continue;
            };
            let queue = state.queue_mut(kind);

            match field {
                "page" => {
                    if let Some(page) = value.parse::<u32>().ok().filter(|p| *p >= 1) {
                        queue.page = page;
                    }
                }
                "limit" => {
                    if let Some(limit) = value
                        .parse::<u32>()
                        .ok()
                        .filter(|l| (1..=max_page_size).contains(l))
                    {
                        queue.limit = limit;
                    }
                }
                "search" => queue.search = value,
                "sort" => {
                    if let Some(sort) = SortKey::parse(&value).filter(|s| s.is_allowed_for(kind)) {
                        queue.sort = sort;
                    }
                }
                "status" => {
                    queue.status = TicketStatus::parse(&value)
                        .filter(|s| QueueFilterState::status_allowed(kind, *s));
                }
                "from" if kind == QueueKind::Closed => {
                    from = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok();
                }
                "to" if kind == QueueKind::Closed => {
                    to = NaiveDate::parse_from_str(&value, DATE_FORMAT).ok();
                }
                _ => {}
            }
        }

        state.closed.date_range = DateRange::new(from, to);
        state
    }

    /// Render the query string, omitting values equal to their defaults.
    pub fn to_query(&self, page_size: u32) -> String {
        let defaults = Self::defaults(page_size);
        let mut pairs: Vec<(String, String)> = Vec::new();

        if self.tab != defaults.tab {
            pairs.push(("tab".to_string(), self.tab.as_str().to_string()));
        }

        for kind in QueueKind::ALL {
            let p = prefix(kind);
            let current = self.queue(kind);
            let default = defaults.queue(kind);

            if current.page != default.page {
                pairs.push((format!("{p}page"), current.page.to_string()));
            }
            if current.limit != default.limit {
                pairs.push((format!("{p}limit"), current.limit.to_string()));
            }
            if !current.search.is_empty() {
                pairs.push((format!("{p}search"), current.search.clone()));
            }
            if current.sort != default.sort {
                pairs.push((format!("{p}sort"), current.sort.as_str().to_string()));
            }
            if let Some(status) = current.status {
                pairs.push((format!("{p}status"), status.as_str().to_string()));
            }
            if let Some(from) = current.date_range.from {
                pairs.push((format!("{p}from"), from.format(DATE_FORMAT).to_string()));
            }
            if let Some(to) = current.date_range.to {
                pairs.push((format!("{p}to"), to.format(DATE_FORMAT).to_string()));
            }
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Capture the committed filter state of every queue.
    pub fn from_filters(tab: Tab, filters: &FilterState) -> Self {
        Self {
            tab,
            unassigned: QueueUrlState::from_filter(filters.get(QueueKind::Unassigned)),
            mine: QueueUrlState::from_filter(filters.get(QueueKind::Mine)),
            closed: QueueUrlState::from_filter(filters.get(QueueKind::Closed)),
        }
    }

    /// Restore every queue's filters from this state.
    pub fn apply_to(&self, filters: &mut FilterState) {
        for kind in QueueKind::ALL {
            self.queue(kind).apply_to(filters.get_mut(kind));
        }
    }
}

/// Keeps the location's query in step with the dashboard.
pub struct UrlStateSync {
    location: Arc<dyn LocationBar>,
    page_size: u32,
    max_page_size: u32,
    mounted: bool,
    last_pushed: Option<String>,
}

impl UrlStateSync {
    pub fn new(location: Arc<dyn LocationBar>, page_size: u32, max_page_size: u32) -> Self {
        Self {
            location,
            page_size,
            max_page_size,
            mounted: false,
            last_pushed: None,
        }
    }

    /// Read the initial state from the location. Pushes are accepted from now on.
    pub fn mount(&mut self) -> DashboardUrlState {
        let state =
            DashboardUrlState::parse(&self.location.query(), self.page_size, self.max_page_size);
        self.last_pushed = Some(state.to_query(self.page_size));
        self.mounted = true;
        debug!(tab = %state.tab, "Restored dashboard state from location");
        state
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.last_pushed = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Write `state` to the location. Returns whether the query was replaced.
    pub fn push(&mut self, state: &DashboardUrlState) -> bool {
        if !self.mounted {
            return false;
        }
        let query = state.to_query(self.page_size);
        if self.last_pushed.as_deref() == Some(query.as_str()) {
            return false;
        }
        self.location.replace_query(&query);
        self.last_pushed = Some(query);
        true
    }
}
