//! Ticket store implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::api::TicketApi;
use crate::filter::{sort_tickets, ListQuery};
use crate::guard::{EditGuard, ViewId};
use crate::ticket::{Queue, QueueKind, Ticket};

use super::types::{
    ReconcileOutcome, RefreshMode, RevertOutcome, StoreError, TicketPatch, TransferReceipt,
};

/// One queue's snapshot plus the bookkeeping needed to reconcile it.
#[derive(Debug, Clone)]
struct QueueSlot {
    queue: Queue,
    /// Query the snapshot was (or is being) fetched with.
    query: ListQuery,
    /// Bumped by every local change; silent polls from older revisions are stale.
    revision: u64,
    /// Bumped by every load and forced refresh; only these supersede a load.
    load_generation: u64,
    /// Bumped whenever a server snapshot replaces the queue.
    snapshot_generation: u64,
    /// A silent poll is awaiting its response.
    poll_in_flight: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    from: QueueKind,
    to: QueueKind,
}

#[derive(Debug)]
struct StoreState {
    slots: HashMap<QueueKind, QueueSlot>,
    pending: HashMap<String, PendingMove>,
}

impl StoreState {
    fn slot(&self, kind: QueueKind) -> &QueueSlot {
        // Every kind is inserted at construction.
        &self.slots[&kind]
    }

    fn slot_mut(&mut self, kind: QueueKind) -> &mut QueueSlot {
        self.slots
            .get_mut(&kind)
            .unwrap_or_else(|| unreachable!("queue slot {} is always present", kind))
    }

    fn touches_pending(&self, kind: QueueKind) -> bool {
        self.pending
            .values()
            .any(|m| m.from == kind || m.to == kind)
    }

    /// Replace a queue with a server snapshot, keeping the membership
    /// invariant between the two personal queues.
    fn replace(&mut self, kind: QueueKind, mut queue: Queue) {
        // A ticket moving elsewhere must not reappear here, nor be counted.
        let pending = &self.pending;
        let before = queue.tickets.len();
        queue
            .tickets
            .retain(|t| pending.get(&t.id).is_none_or(|m| m.to == kind));
        let dropped = before - queue.tickets.len();

        let slot = self.slot_mut(kind);
        sort_tickets(&mut queue.tickets, slot.query.filters.sort);
        queue.pagination = queue.pagination.normalized();
        for _ in 0..dropped {
            queue.pagination.decrement();
        }
        slot.queue = queue;
        slot.snapshot_generation += 1;

        if !kind.is_personal() {
            return;
        }
        let other = match kind {
            QueueKind::Unassigned => QueueKind::Mine,
            _ => QueueKind::Unassigned,
        };
        let fresh: Vec<String> = self.slot(kind).queue.tickets.iter().map(|t| t.id.clone()).collect();
        let other_slot = self.slot_mut(other);
        for id in fresh {
            if let Some(pos) = other_slot.queue.position(&id) {
                debug!(ticket_id = %id, from = %other, to = %kind, "Ticket moved between queues on the server");
                other_slot.queue.tickets.remove(pos);
                other_slot.queue.pagination.decrement();
            }
        }
    }
}

/// Client-side holder of the unassigned, mine and closed queues.
pub struct TicketStore {
    api: Arc<dyn TicketApi>,
    guard: EditGuard,
    state: Mutex<StoreState>,
}

impl TicketStore {
    /// Create a store with empty first pages for every queue.
    pub fn new(api: Arc<dyn TicketApi>, guard: EditGuard, page_size: u32) -> Self {
        let slots = QueueKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    QueueSlot {
                        queue: Queue::empty(page_size),
                        query: ListQuery::first_page(kind, page_size),
                        revision: 0,
                        load_generation: 0,
                        snapshot_generation: 0,
                        poll_in_flight: false,
                    },
                )
            })
            .collect();

        Self {
            api,
            guard,
            state: Mutex::new(StoreState {
                slots,
                pending: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot of a queue.
    pub fn snapshot(&self, kind: QueueKind) -> Queue {
        self.lock().slot(kind).queue.clone()
    }

    /// Query the queue is fetched with.
    pub fn query(&self, kind: QueueKind) -> ListQuery {
        self.lock().slot(kind).query.clone()
    }

    /// Queues whose snapshot currently holds the ticket.
    pub fn queues_containing(&self, ticket_id: &str) -> Vec<QueueKind> {
        let state = self.lock();
        QueueKind::ALL
            .into_iter()
            .filter(|kind| state.slot(*kind).queue.contains(ticket_id))
            .collect()
    }

    /// Whether the ticket has a transfer awaiting the server.
    pub fn is_pending(&self, ticket_id: &str) -> bool {
        self.lock().pending.contains_key(ticket_id)
    }

    /// Fetch a page and replace the queue with it.
    ///
    /// Used for the first fetch of a view and for explicit filter or page
    /// changes. On failure the previous snapshot is kept. Only a newer load
    /// or forced refresh discards the response; tickets moved by a pending
    /// transfer are filtered out of it.
    pub async fn load(&self, kind: QueueKind, query: ListQuery) -> Result<Queue, StoreError> {
        let generation = {
            let mut state = self.lock();
            let slot = state.slot_mut(kind);
            slot.revision += 1;
            slot.load_generation += 1;
            slot.query = query.clone();
            slot.load_generation
        };

        debug!(queue = %kind, page = query.page, page_size = query.page_size, "Loading queue");
        let response = self
            .api
            .list(kind, &query)
            .await
            .map_err(|source| StoreError::Network { queue: kind, source })?;

        let mut state = self.lock();
        if state.slot(kind).load_generation != generation {
            debug!(queue = %kind, "Dropping superseded load response");
            return Err(StoreError::Superseded(kind));
        }
        state.replace(kind, response.into());
        state.slot_mut(kind).revision += 1;
        Ok(state.slot(kind).queue.clone())
    }

    /// Replace a queue with a server snapshot unless its view is being edited.
    pub fn reconcile(&self, kind: QueueKind, server_queue: Queue) -> ReconcileOutcome {
        if self.guard.is_active(&ViewId::for_queue(kind)) {
            debug!(queue = %kind, "Reconcile suppressed by active edit");
            return ReconcileOutcome::Suppressed;
        }
        let mut state = self.lock();
        if state.touches_pending(kind) {
            debug!(queue = %kind, "Reconcile deferred while a transfer is pending");
            return ReconcileOutcome::Stale;
        }
        state.replace(kind, server_queue);
        state.slot_mut(kind).revision += 1;
        ReconcileOutcome::Applied
    }

    /// Fetch the queue with its current query and reconcile it.
    ///
    /// Silent refreshes skip entirely while a previous silent poll of the same
    /// queue is outstanding, while its view is being edited, or while a
    /// transfer into or out of it awaits the server. Forced refreshes always
    /// fetch and replace.
    pub async fn refresh(
        &self,
        kind: QueueKind,
        mode: RefreshMode,
    ) -> Result<ReconcileOutcome, StoreError> {
        let view = ViewId::for_queue(kind);
        let (revision, generation, query) = {
            let mut state = self.lock();
            if mode == RefreshMode::Silent {
                if self.guard.is_active(&view) {
                    debug!(queue = %kind, "Silent refresh suppressed by active edit");
                    return Ok(ReconcileOutcome::Suppressed);
                }
                if state.touches_pending(kind) {
                    debug!(queue = %kind, "Silent refresh skipped while a transfer is pending");
                    return Ok(ReconcileOutcome::Stale);
                }
            }
            let slot = state.slot_mut(kind);
            match mode {
                RefreshMode::Silent => {
                    if slot.poll_in_flight {
                        debug!(queue = %kind, "Previous poll still outstanding, skipping tick");
                        return Ok(ReconcileOutcome::InFlight);
                    }
                    slot.poll_in_flight = true;
                }
                RefreshMode::Forced => {
                    slot.revision += 1;
                    slot.load_generation += 1;
                }
            }
            (slot.revision, slot.load_generation, slot.query.clone())
        };

        let result = self.api.list(kind, &query).await;

        let mut state = self.lock();
        if mode == RefreshMode::Silent {
            state.slot_mut(kind).poll_in_flight = false;
        }
        let response = result.map_err(|source| StoreError::Network { queue: kind, source })?;

        let superseded = match mode {
            RefreshMode::Silent => state.slot(kind).revision != revision,
            RefreshMode::Forced => state.slot(kind).load_generation != generation,
        };
        if superseded {
            debug!(queue = %kind, mode = ?mode, "Dropping stale refresh response");
            return Ok(ReconcileOutcome::Stale);
        }
        if mode == RefreshMode::Silent {
            if self.guard.is_active(&view) {
                debug!(queue = %kind, "Edit started while polling, dropping response");
                return Ok(ReconcileOutcome::Suppressed);
            }
            if state.touches_pending(kind) {
                return Ok(ReconcileOutcome::Stale);
            }
        }

        state.replace(kind, response.into());
        state.slot_mut(kind).revision += 1;
        Ok(ReconcileOutcome::Applied)
    }

    /// Move a ticket between queues locally, before any request is sent.
    ///
    /// Removes the summary from `from` and decrements its count, then inserts
    /// the patched summary into `to` at its sorted position and increments
    /// that count. The returned receipt settles the move later.
    pub fn apply_optimistic_transfer(
        &self,
        ticket_id: &str,
        from: QueueKind,
        to: QueueKind,
        patch: &TicketPatch,
    ) -> Result<TransferReceipt, StoreError> {
        let mut state = self.lock();
        if state.pending.contains_key(ticket_id) {
            return Err(StoreError::TransferPending(ticket_id.to_string()));
        }

        let source = state.slot_mut(from);
        let original_index = source
            .queue
            .position(ticket_id)
            .ok_or_else(|| StoreError::NotInQueue {
                ticket_id: ticket_id.to_string(),
                queue: from,
            })?;
        let original = source.queue.tickets.remove(original_index);
        source.queue.pagination.decrement();
        source.revision += 1;
        let source_generation = source.snapshot_generation;

        let mut provisional = original.clone();
        patch.apply(&mut provisional);

        let target = state.slot_mut(to);
        if let Some(pos) = target.queue.position(ticket_id) {
            target.queue.tickets.remove(pos);
            target.queue.pagination.decrement();
        }
        insert_sorted(target, provisional);
        target.queue.pagination.increment();
        target.revision += 1;

        state
            .pending
            .insert(ticket_id.to_string(), PendingMove { from, to });

        info!(ticket_id, from = %from, to = %to, "Applied optimistic transfer");
        Ok(TransferReceipt {
            ticket_id: ticket_id.to_string(),
            from,
            to,
            original,
            original_index,
            source_generation,
        })
    }

    /// Settle a transfer the server accepted, taking the server's view of
    /// the ticket for the provisional summary.
    pub fn confirm_transfer(&self, receipt: &TransferReceipt, server_ticket: Ticket) {
        let mut state = self.lock();
        state.pending.remove(&receipt.ticket_id);

        let target = state.slot_mut(receipt.to);
        match target.queue.position(&receipt.ticket_id) {
            Some(pos) => {
                target.queue.tickets.remove(pos);
                insert_sorted(target, server_ticket);
                target.revision += 1;
            }
            None => {
                // A forced reload already replaced the queue with server data.
                debug!(ticket_id = %receipt.ticket_id, "Provisional summary already reconciled away");
            }
        }
    }

    /// Undo an optimistic transfer: drop the provisional summary from the
    /// target and put the original back where it was in the source.
    ///
    /// When the source was reloaded while the transfer was pending, the
    /// original no longer belongs to its snapshot and is not reinserted;
    /// the caller resyncs the source instead.
    pub fn revert_transfer(&self, receipt: &TransferReceipt) -> RevertOutcome {
        let mut state = self.lock();
        state.pending.remove(&receipt.ticket_id);

        let target = state.slot_mut(receipt.to);
        if let Some(pos) = target.queue.position(&receipt.ticket_id) {
            target.queue.tickets.remove(pos);
            target.queue.pagination.decrement();
        }
        target.revision += 1;

        let source = state.slot_mut(receipt.from);
        source.revision += 1;
        if source.snapshot_generation != receipt.source_generation {
            warn!(ticket_id = %receipt.ticket_id, queue = %receipt.from, "Source queue reloaded during transfer, resync needed");
            return RevertOutcome::SourceReloaded;
        }
        if !source.queue.contains(&receipt.ticket_id) {
            let index = receipt.original_index.min(source.queue.tickets.len());
            source.queue.tickets.insert(index, receipt.original.clone());
            source.queue.pagination.increment();
        } else {
            warn!(ticket_id = %receipt.ticket_id, queue = %receipt.from, "Ticket already back in source queue");
        }

        info!(ticket_id = %receipt.ticket_id, from = %receipt.from, to = %receipt.to, "Reverted optimistic transfer");
        RevertOutcome::Restored
    }
}

fn insert_sorted(slot: &mut QueueSlot, ticket: Ticket) {
    let sort = slot.query.filters.sort;
    let index = slot
        .queue
        .tickets
        .partition_point(|t| sort.compare(t, &ticket).is_le());
    slot.queue.tickets.insert(index, ticket);
}
