//! Ticket detail view implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::activity::NewActivityDetector;
use crate::api::{NewComment, StatusUpdate};
use crate::guard::{EditKind, ViewId};
use crate::refresh::PollTarget;
use crate::ticket::{Priority, TicketDetail, TicketStatus};

use super::types::{
    CommentDraft, DetailContext, DetailError, DetailPollOutcome, Navigation, ScrollRequest,
    StatusSelection,
};
use super::validate::{validate_comment, validate_reason, ValidationError};

#[derive(Debug, Default)]
struct DetailState {
    detail: Option<TicketDetail>,
    draft: CommentDraft,
    selection: Option<StatusSelection>,
    detector: NewActivityDetector,
    /// Bumped by every reload and by close; responses from older
    /// generations are ignored.
    generation: u64,
    closed: bool,
}

/// Controller for one opened ticket.
pub struct TicketDetailView {
    ticket_id: String,
    view: ViewId,
    ctx: DetailContext,
    state: Mutex<DetailState>,
    poll_in_flight: AtomicBool,
}

impl TicketDetailView {
    pub fn new(ticket_id: impl Into<String>, ctx: DetailContext) -> Arc<Self> {
        let ticket_id = ticket_id.into();
        Arc::new(Self {
            view: ViewId::Ticket(ticket_id.clone()),
            ticket_id,
            ctx,
            state: Mutex::new(DetailState::default()),
            poll_in_flight: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> MutexGuard<'_, DetailState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view
    }

    /// Load the ticket, start polling its thread and mark it read.
    ///
    /// A missing ticket sends the agent back to the list.
    pub async fn open(self: &Arc<Self>) -> Result<Navigation, DetailError> {
        match self.reload().await {
            Ok(()) => {}
            Err(DetailError::NotFound(id)) => {
                warn!(ticket_id = %id, "Ticket not found, returning to list");
                self.ctx
                    .notifications
                    .error(&format!("Ticket {} was not found", id));
                self.close();
                return Ok(Navigation::BackToList);
            }
            Err(e) => {
                self.ctx
                    .notifications
                    .error(&format!("Could not load ticket: {}", e));
                return Err(e);
            }
        }

        let poller = Arc::new(DetailPoller {
            view: Arc::downgrade(self),
        });
        self.ctx
            .scheduler
            .start(self.view.clone(), self.ctx.poll_interval, poller);
        self.spawn_mark_read();

        info!(ticket_id = %self.ticket_id, "Opened ticket");
        Ok(Navigation::Stay)
    }

    /// Stop polling and drop the snapshot and any open edits.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            state.closed = true;
            state.generation += 1;
            state.detail = None;
            state.draft = CommentDraft::default();
            state.selection = None;
        }
        self.ctx.scheduler.stop(&self.view);
        self.ctx.guard.clear(&self.view);
        debug!(ticket_id = %self.ticket_id, "Closed ticket");
    }

    fn spawn_mark_read(&self) {
        let api = Arc::clone(&self.ctx.api);
        let ticket_id = self.ticket_id.clone();
        tokio::spawn(async move {
            if let Err(e) = api.mark_read(&ticket_id).await {
                warn!(ticket_id = %ticket_id, error = %e, "Failed to mark ticket read");
            }
        });
    }

    /// Visible reload of the ticket.
    pub async fn reload(&self) -> Result<(), DetailError> {
        let generation = {
            let mut state = self.lock();
            if state.closed {
                return Err(DetailError::Closed);
            }
            state.generation += 1;
            state.generation
        };

        let detail = self.ctx.api.get_detail(&self.ticket_id).await?;

        let mut state = self.lock();
        if state.closed || state.generation != generation {
            debug!(ticket_id = %self.ticket_id, "Dropping superseded detail response");
            return Ok(());
        }
        state.detector.reset(detail.comment_count());
        state.detail = Some(detail);
        Ok(())
    }

    /// Background poll of the comment thread.
    pub async fn poll_silent(&self) -> DetailPollOutcome {
        if self.ctx.guard.is_active(&self.view) {
            return DetailPollOutcome::Suppressed;
        }
        if self
            .poll_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return DetailPollOutcome::InFlight;
        }

        let generation = {
            let state = self.lock();
            if state.closed {
                self.poll_in_flight.store(false, Ordering::SeqCst);
                return DetailPollOutcome::Stale;
            }
            state.generation
        };

        let result = self.ctx.api.get_detail(&self.ticket_id).await;
        self.poll_in_flight.store(false, Ordering::SeqCst);

        let detail = match result {
            Ok(detail) => detail,
            Err(e) => {
                warn!(ticket_id = %self.ticket_id, error = %e, "Silent detail poll failed");
                return DetailPollOutcome::Failed;
            }
        };

        let edit_active = self.ctx.guard.is_active(&self.view);
        let mut state = self.lock();
        if state.closed || state.generation != generation {
            return DetailPollOutcome::Stale;
        }
        if edit_active {
            return DetailPollOutcome::Suppressed;
        }

        let count = detail.comment_count();
        state.detector.observe(count);
        if state.detector.has_new_activity() {
            debug!(ticket_id = %self.ticket_id, comments = count, "New activity on ticket");
            DetailPollOutcome::NewActivity
        } else {
            state.detail = Some(detail);
            DetailPollOutcome::Updated
        }
    }

    /// Dismiss the new-activity banner, reload and scroll to the newest comment.
    pub async fn dismiss_activity(&self) -> Result<ScrollRequest, DetailError> {
        self.lock().detector.dismiss();
        self.reload().await?;
        Ok(ScrollRequest::LatestComment)
    }

    // Comment draft

    /// Update the comment being composed.
    pub fn edit_comment(&self, text: impl Into<String>) {
        self.ctx.guard.begin(&self.view, EditKind::Comment);
        self.lock().draft.text = text.into();
    }

    pub fn set_resolution(&self, is_resolution: bool) {
        self.ctx.guard.begin(&self.view, EditKind::Comment);
        self.lock().draft.is_resolution = is_resolution;
    }

    pub fn cancel_comment(&self) {
        self.lock().draft = CommentDraft::default();
        self.ctx.guard.end(&self.view, EditKind::Comment);
    }

    /// Validate and send the draft. The draft survives failures.
    pub async fn submit_comment(&self) -> Result<(), DetailError> {
        let comment = {
            let state = self.lock();
            if state.closed {
                return Err(DetailError::Closed);
            }
            let text = validate_comment(&state.draft.text)?;
            NewComment {
                text: text.to_string(),
                is_resolution: state.draft.is_resolution,
            }
        };

        if let Err(e) = self.ctx.api.add_comment(&self.ticket_id, &comment).await {
            self.ctx
                .notifications
                .error(&format!("Could not add comment: {}", e));
            return Err(e.into());
        }

        self.lock().draft = CommentDraft::default();
        self.ctx.guard.end(&self.view, EditKind::Comment);
        self.ctx.notifications.success(if comment.is_resolution {
            "Resolution added"
        } else {
            "Comment added"
        });
        self.reload_after_action().await;
        Ok(())
    }

    // Status and priority

    /// Pick a new status; held until submitted or cancelled.
    pub fn select_status(&self, status: TicketStatus) {
        self.ctx.guard.begin(&self.view, EditKind::StatusSelection);
        let mut state = self.lock();
        let reason = state
            .selection
            .take()
            .map(|s| s.reason)
            .unwrap_or_default();
        state.selection = Some(StatusSelection { status, reason });
    }

    pub fn set_status_reason(&self, reason: impl Into<String>) {
        if let Some(selection) = self.lock().selection.as_mut() {
            selection.reason = reason.into();
        }
    }

    pub fn cancel_status(&self) {
        self.lock().selection = None;
        self.ctx.guard.end(&self.view, EditKind::StatusSelection);
    }

    /// Validate and send the selected status change.
    pub async fn submit_status(&self) -> Result<(), DetailError> {
        let update = {
            let state = self.lock();
            if state.closed {
                return Err(DetailError::Closed);
            }
            let selection = state
                .selection
                .as_ref()
                .ok_or(ValidationError::NoStatusSelected)?;
            StatusUpdate {
                status: selection.status,
                reason: validate_reason(&selection.reason)?.map(str::to_string),
            }
        };

        if let Err(e) = self.ctx.api.update_status(&self.ticket_id, &update).await {
            self.ctx
                .notifications
                .error(&format!("Could not change status: {}", e));
            return Err(e.into());
        }

        self.lock().selection = None;
        self.ctx.guard.end(&self.view, EditKind::StatusSelection);
        self.ctx
            .notifications
            .success(&format!("Status changed to {}", update.status));
        self.reload_after_action().await;
        Ok(())
    }

    /// Change the ticket's priority.
    pub async fn update_priority(&self, priority: Priority) -> Result<(), DetailError> {
        if self.lock().closed {
            return Err(DetailError::Closed);
        }
        if let Err(e) = self.ctx.api.update_priority(&self.ticket_id, priority).await {
            self.ctx
                .notifications
                .error(&format!("Could not change priority: {}", e));
            return Err(e.into());
        }
        self.ctx
            .notifications
            .success(&format!("Priority changed to {}", priority));
        self.reload_after_action().await;
        Ok(())
    }

    async fn reload_after_action(&self) {
        if let Err(e) = self.reload().await {
            warn!(ticket_id = %self.ticket_id, error = %e, "Reload after action failed");
            self.ctx
                .notifications
                .error(&format!("Could not refresh ticket: {}", e));
        }
    }

    // Accessors

    pub fn detail(&self) -> Option<TicketDetail> {
        self.lock().detail.clone()
    }

    pub fn draft(&self) -> CommentDraft {
        self.lock().draft.clone()
    }

    pub fn status_selection(&self) -> Option<StatusSelection> {
        self.lock().selection.clone()
    }

    pub fn has_new_activity(&self) -> bool {
        self.lock().detector.has_new_activity()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Poll target handed to the scheduler; does not keep the view alive.
struct DetailPoller {
    view: Weak<TicketDetailView>,
}

#[async_trait]
impl PollTarget for DetailPoller {
    async fn poll(&self) {
        if let Some(view) = self.view.upgrade() {
            let outcome = view.poll_silent().await;
            debug!(ticket_id = %view.ticket_id, ?outcome, "Detail poll finished");
        }
    }
}
