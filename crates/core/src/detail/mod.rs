//! Ticket detail view: comment thread, drafts and status changes.
//!
//! The detail view polls its ticket silently on a short interval. New
//! comments never replace the visible thread on their own; they raise a
//! banner, and dismissing the banner reloads and scrolls to the latest
//! comment. Drafts and pending status selections hold the edit guard so that
//! polls leave them alone.

mod types;
mod validate;
mod view;

pub use types::{
    CommentDraft, DetailContext, DetailError, DetailPollOutcome, Navigation, ScrollRequest,
    StatusSelection,
};
pub use validate::{
    validate_comment, validate_reason, ValidationError, COMMENT_MAX_CHARS, COMMENT_MIN_CHARS,
    REASON_MAX_CHARS,
};
pub use view::TicketDetailView;
