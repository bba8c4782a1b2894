//! Mock ticket API for testing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use crate::api::{ApiError, ListResponse, NewComment, StatusUpdate, TicketApi};
use crate::filter::ListQuery;
use crate::ticket::{
    AuthorType, Comment, Pagination, Priority, QueueKind, Ticket, TicketDetail, TicketStatus,
};

use super::fixtures::{AGENT_ID, AGENT_SERVER_NAME};

#[derive(Default)]
struct MockState {
    /// Server-side contents of each queue, in server order.
    queues: HashMap<QueueKind, Vec<Ticket>>,
    details: HashMap<String, TicketDetail>,

    list_calls: Vec<(QueueKind, ListQuery)>,
    detail_calls: Vec<String>,
    assign_calls: Vec<String>,
    assign_to_me_calls: Vec<String>,
    mark_read_calls: Vec<String>,
    status_calls: Vec<(String, StatusUpdate)>,
    priority_calls: Vec<(String, Priority)>,
    comment_calls: Vec<(String, NewComment)>,

    next_list_error: Option<ApiError>,
    next_detail_error: Option<ApiError>,
    next_assign_error: Option<ApiError>,
    next_mark_read_error: Option<ApiError>,
    next_status_error: Option<ApiError>,
    next_comment_error: Option<ApiError>,
}

/// Mock implementation of the `TicketApi` trait.
///
/// Provides controllable behavior for testing:
/// - Serve configurable queues (filtered and paginated like the server)
///   and ticket details
/// - Record every call for assertions
/// - Fail the next call of a kind with a given error
/// - Hold list or assignment responses until released, to observe the
///   state while a request is in flight
///
/// Assignments move the ticket from the server's unassigned queue to its
/// mine queue, assigned to [`AGENT_ID`] as [`AGENT_SERVER_NAME`].
pub struct MockTicketApi {
    state: Mutex<MockState>,
    list_gate: watch::Sender<bool>,
    assign_gate: watch::Sender<bool>,
}

impl std::fmt::Debug for MockTicketApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTicketApi")
            .field("state", &"<state>")
            .field("list_gate", &*self.list_gate.borrow())
            .field("assign_gate", &*self.assign_gate.borrow())
            .finish()
    }
}

impl Default for MockTicketApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTicketApi {
    /// Create a mock with empty queues and open gates.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            list_gate: watch::Sender::new(true),
            assign_gate: watch::Sender::new(true),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Server state

    /// Replace the server-side contents of a queue.
    pub fn set_queue(&self, kind: QueueKind, tickets: Vec<Ticket>) {
        self.lock().queues.insert(kind, tickets);
    }

    pub fn server_queue(&self, kind: QueueKind) -> Vec<Ticket> {
        self.lock().queues.get(&kind).cloned().unwrap_or_default()
    }

    pub fn set_detail(&self, detail: TicketDetail) {
        self.lock().details.insert(detail.ticket.id.clone(), detail);
    }

    /// Append a customer comment to a ticket's thread.
    pub fn push_comment(&self, ticket_id: &str, text: &str) {
        if let Some(detail) = self.lock().details.get_mut(ticket_id) {
            let comment = Comment {
                id: format!("{}-c{}", ticket_id, detail.comments.len() + 1),
                author_name: detail
                    .ticket
                    .customer_name
                    .clone()
                    .unwrap_or_else(|| "Customer".to_string()),
                author_type: AuthorType::Customer,
                text: text.to_string(),
                is_resolution: false,
                created_at: Utc::now(),
            };
            detail.comments.push(comment);
        }
    }

    pub fn set_detail_status(&self, ticket_id: &str, status: TicketStatus) {
        if let Some(detail) = self.lock().details.get_mut(ticket_id) {
            detail.ticket.status = status;
        }
    }

    // Failure injection

    pub fn fail_next_list(&self, error: ApiError) {
        self.lock().next_list_error = Some(error);
    }

    pub fn fail_next_detail(&self, error: ApiError) {
        self.lock().next_detail_error = Some(error);
    }

    /// Fail the next `assign` or `assign_to_me` call.
    pub fn fail_next_assign(&self, error: ApiError) {
        self.lock().next_assign_error = Some(error);
    }

    pub fn fail_next_mark_read(&self, error: ApiError) {
        self.lock().next_mark_read_error = Some(error);
    }

    pub fn fail_next_status(&self, error: ApiError) {
        self.lock().next_status_error = Some(error);
    }

    pub fn fail_next_comment(&self, error: ApiError) {
        self.lock().next_comment_error = Some(error);
    }

    // Gates

    /// Hold list responses until [`MockTicketApi::resume_lists`].
    pub fn pause_lists(&self) {
        self.list_gate.send_replace(false);
    }

    pub fn resume_lists(&self) {
        self.list_gate.send_replace(true);
    }

    /// Hold assignment responses until [`MockTicketApi::resume_assignments`].
    pub fn pause_assignments(&self) {
        self.assign_gate.send_replace(false);
    }

    pub fn resume_assignments(&self) {
        self.assign_gate.send_replace(true);
    }

    async fn pass(gate: &watch::Sender<bool>) {
        let mut rx = gate.subscribe();
        // The sender lives as long as the mock, so this only fails if the
        // mock is dropped mid-call.
        let _ = rx.wait_for(|open| *open).await;
    }

    // Recorded calls

    pub fn list_calls(&self) -> Vec<(QueueKind, ListQuery)> {
        self.lock().list_calls.clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.lock().detail_calls.clone()
    }

    pub fn assign_calls(&self) -> Vec<String> {
        self.lock().assign_calls.clone()
    }

    pub fn assign_to_me_calls(&self) -> Vec<String> {
        self.lock().assign_to_me_calls.clone()
    }

    pub fn mark_read_calls(&self) -> Vec<String> {
        self.lock().mark_read_calls.clone()
    }

    pub fn status_calls(&self) -> Vec<(String, StatusUpdate)> {
        self.lock().status_calls.clone()
    }

    pub fn priority_calls(&self) -> Vec<(String, Priority)> {
        self.lock().priority_calls.clone()
    }

    pub fn comment_calls(&self) -> Vec<(String, NewComment)> {
        self.lock().comment_calls.clone()
    }

    fn claim(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        let mut state = self.lock();
        if let Some(error) = state.next_assign_error.take() {
            return Err(error);
        }

        let unassigned = state.queues.entry(QueueKind::Unassigned).or_default();
        let Some(pos) = unassigned.iter().position(|t| t.id == ticket_id) else {
            return Err(ApiError::Conflict(format!(
                "ticket {} is not unassigned",
                ticket_id
            )));
        };
        let mut ticket = unassigned.remove(pos);
        ticket.assignee_id = Some(AGENT_ID.to_string());
        ticket.assignee_name = Some(AGENT_SERVER_NAME.to_string());
        if ticket.status == TicketStatus::Open {
            ticket.status = TicketStatus::Assigned;
        }
        state
            .queues
            .entry(QueueKind::Mine)
            .or_default()
            .push(ticket.clone());
        if let Some(detail) = state.details.get_mut(ticket_id) {
            detail.ticket = ticket.clone();
        }
        Ok(ticket)
    }
}

fn matches_query(ticket: &Ticket, query: &ListQuery) -> bool {
    let filters = &query.filters;
    if let Some(status) = filters.status {
        if ticket.status != status {
            return false;
        }
    }
    if let Some(closed) = ticket.closed_at.map(|c| c.date_naive()) {
        if filters.date_range.from.is_some_and(|from| closed < from)
            || filters.date_range.to.is_some_and(|to| closed > to)
        {
            return false;
        }
    }
    let needle = filters.search.trim().to_lowercase();
    needle.is_empty()
        || ticket.subject.to_lowercase().contains(&needle)
        || ticket
            .customer_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
}

#[async_trait]
impl TicketApi for MockTicketApi {
    async fn list(&self, kind: QueueKind, query: &ListQuery) -> Result<ListResponse, ApiError> {
        self.lock().list_calls.push((kind, query.clone()));
        Self::pass(&self.list_gate).await;

        let mut state = self.lock();
        if let Some(error) = state.next_list_error.take() {
            return Err(error);
        }

        let matching: Vec<Ticket> = state
            .queues
            .get(&kind)
            .map(|tickets| {
                tickets
                    .iter()
                    .filter(|t| matches_query(t, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let pagination = Pagination::new(query.page, query.page_size, matching.len() as u64);
        let start = (pagination.page as usize - 1) * pagination.page_size as usize;
        let tickets = matching
            .into_iter()
            .skip(start)
            .take(pagination.page_size as usize)
            .collect();

        Ok(ListResponse {
            tickets,
            pagination,
        })
    }

    async fn get_detail(&self, ticket_id: &str) -> Result<TicketDetail, ApiError> {
        let mut state = self.lock();
        state.detail_calls.push(ticket_id.to_string());
        if let Some(error) = state.next_detail_error.take() {
            return Err(error);
        }
        state
            .details
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(ticket_id.to_string()))
    }

    async fn update_status(&self, ticket_id: &str, update: &StatusUpdate) -> Result<(), ApiError> {
        let mut state = self.lock();
        state
            .status_calls
            .push((ticket_id.to_string(), update.clone()));
        if let Some(error) = state.next_status_error.take() {
            return Err(error);
        }
        let detail = state
            .details
            .get_mut(ticket_id)
            .ok_or_else(|| ApiError::NotFound(ticket_id.to_string()))?;
        detail.ticket.status = update.status;
        if update.status.is_terminal() {
            detail.ticket.closed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_priority(&self, ticket_id: &str, priority: Priority) -> Result<(), ApiError> {
        let mut state = self.lock();
        state
            .priority_calls
            .push((ticket_id.to_string(), priority));
        let detail = state
            .details
            .get_mut(ticket_id)
            .ok_or_else(|| ApiError::NotFound(ticket_id.to_string()))?;
        detail.ticket.priority = priority;
        Ok(())
    }

    async fn add_comment(&self, ticket_id: &str, comment: &NewComment) -> Result<(), ApiError> {
        let mut state = self.lock();
        state
            .comment_calls
            .push((ticket_id.to_string(), comment.clone()));
        if let Some(error) = state.next_comment_error.take() {
            return Err(error);
        }
        let detail = state
            .details
            .get_mut(ticket_id)
            .ok_or_else(|| ApiError::NotFound(ticket_id.to_string()))?;
        let id = format!("{}-c{}", ticket_id, detail.comments.len() + 1);
        detail.comments.push(Comment {
            id,
            author_name: AGENT_SERVER_NAME.to_string(),
            author_type: AuthorType::Tech,
            text: comment.text.clone(),
            is_resolution: comment.is_resolution,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn assign(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.lock().assign_calls.push(ticket_id.to_string());
        Self::pass(&self.assign_gate).await;
        self.claim(ticket_id)
    }

    async fn assign_to_me(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.lock().assign_to_me_calls.push(ticket_id.to_string());
        Self::pass(&self.assign_gate).await;
        self.claim(ticket_id)
    }

    async fn mark_read(&self, ticket_id: &str) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.mark_read_calls.push(ticket_id.to_string());
        if let Some(error) = state.next_mark_read_error.take() {
            return Err(error);
        }
        if let Some(detail) = state.details.get_mut(ticket_id) {
            detail.ticket.unread_customer_comments = 0;
        }
        Ok(())
    }
}
