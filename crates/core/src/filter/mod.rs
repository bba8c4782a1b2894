//! Per-queue filter, sort and pagination state.
//!
//! Free-text search is debounced: the raw input follows every keystroke while
//! the committed value used for fetching only changes once typing pauses.
//! Every other filter change takes effect immediately and sends the queue
//! back to its first page.

mod debounce;
mod sort;
mod state;

pub use debounce::Debounced;
pub use sort::{sort_tickets, SortKey};
pub use state::{DateRange, FilterState, ListFilters, ListQuery, QueueFilterState};
