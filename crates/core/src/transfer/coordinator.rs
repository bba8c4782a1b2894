//! Transfer coordinator implementation.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::TicketApi;
use crate::config::AgentConfig;
use crate::notify::Notifications;
use crate::store::{
    RefreshMode, RevertOutcome, StoreError, TicketPatch, TicketStore, TransferReceipt,
};
use crate::ticket::QueueKind;

use super::types::{Transfer, TransferError, TransferState, TransferTrigger};

/// Runs assignment transfers against the store and the ticket API.
#[derive(Clone)]
pub struct TransferCoordinator {
    store: Arc<TicketStore>,
    api: Arc<dyn TicketApi>,
    agent: AgentConfig,
    notifications: Notifications,
}

impl TransferCoordinator {
    pub fn new(
        store: Arc<TicketStore>,
        api: Arc<dyn TicketApi>,
        agent: AgentConfig,
        notifications: Notifications,
    ) -> Self {
        Self {
            store,
            api,
            agent,
            notifications,
        }
    }

    /// Apply the optimistic move and return the transfer awaiting the server.
    ///
    /// Nothing is sent until [`PendingTransfer::settle`] is awaited, but the
    /// store already reflects the move when this returns.
    pub fn begin(
        &self,
        ticket_id: &str,
        source: QueueKind,
        target: QueueKind,
        trigger: TransferTrigger,
    ) -> Result<PendingTransfer, TransferError> {
        if source != QueueKind::Unassigned || target != QueueKind::Mine {
            return Err(TransferError::InvalidRoute {
                from: source,
                to: target,
            });
        }

        let current_status = self
            .store
            .snapshot(source)
            .get(ticket_id)
            .map(|t| t.status)
            .ok_or_else(|| StoreError::NotInQueue {
                ticket_id: ticket_id.to_string(),
                queue: source,
            })?;
        let patch = TicketPatch::assign_to(&self.agent.id, &self.agent.name, current_status);

        let mut transfer = Transfer::new(ticket_id, source, target, trigger);
        let receipt = self
            .store
            .apply_optimistic_transfer(ticket_id, source, target, &patch)?;
        transfer.advance(TransferState::Pending);

        Ok(PendingTransfer {
            coordinator: self.clone(),
            receipt,
            transfer,
        })
    }

    /// Drag a ticket from `source` onto `target`.
    pub async fn transfer(
        &self,
        ticket_id: &str,
        source: QueueKind,
        target: QueueKind,
    ) -> Result<Transfer, TransferError> {
        let pending = self.begin(ticket_id, source, target, TransferTrigger::Drag)?;
        Ok(pending.settle().await)
    }

    /// Assign an unassigned ticket to the acting agent from its button.
    pub async fn assign(&self, ticket_id: &str) -> Result<Transfer, TransferError> {
        let pending = self.begin(
            ticket_id,
            QueueKind::Unassigned,
            QueueKind::Mine,
            TransferTrigger::Button,
        )?;
        Ok(pending.settle().await)
    }
}

/// A transfer whose optimistic step is applied and whose request is not
/// yet resolved.
pub struct PendingTransfer {
    coordinator: TransferCoordinator,
    receipt: TransferReceipt,
    transfer: Transfer,
}

impl PendingTransfer {
    pub fn transfer(&self) -> &Transfer {
        &self.transfer
    }

    /// Send the assignment request and settle the transfer.
    pub async fn settle(self) -> Transfer {
        let PendingTransfer {
            coordinator,
            receipt,
            mut transfer,
        } = self;
        let number = receipt.original.number;

        let result = match transfer.trigger {
            TransferTrigger::Drag => coordinator.api.assign_to_me(&transfer.ticket_id).await,
            TransferTrigger::Button => coordinator.api.assign(&transfer.ticket_id).await,
        };

        match result {
            Ok(ticket) => {
                coordinator.store.confirm_transfer(&receipt, ticket);
                transfer.advance(TransferState::Committed);
                info!(ticket_id = %transfer.ticket_id, transfer_id = %transfer.id, "Transfer committed");
                coordinator
                    .notifications
                    .success(&format!("Ticket #{} assigned to you", number));
            }
            Err(e) if e.is_conflict() => {
                coordinator.store.revert_transfer(&receipt);
                warn!(ticket_id = %transfer.ticket_id, error = %e, "Ticket already claimed, rolled back");
                coordinator.notifications.warning(&format!(
                    "Ticket #{} was already claimed by another agent",
                    number
                ));
                transfer.failure = Some(e);
                transfer.advance(TransferState::RolledBack);

                if let Err(e) = coordinator
                    .store
                    .refresh(transfer.source, RefreshMode::Forced)
                    .await
                {
                    error!(queue = %transfer.source, error = %e, "Resync after conflict failed");
                }
            }
            Err(e) => {
                let outcome = coordinator.store.revert_transfer(&receipt);
                error!(ticket_id = %transfer.ticket_id, error = %e, "Transfer failed, rolled back");
                coordinator
                    .notifications
                    .error(&format!("Could not assign ticket #{}: {}", number, e));
                transfer.failure = Some(e);
                transfer.advance(TransferState::RolledBack);

                if outcome == RevertOutcome::SourceReloaded {
                    if let Err(e) = coordinator
                        .store
                        .refresh(transfer.source, RefreshMode::Forced)
                        .await
                    {
                        error!(queue = %transfer.source, error = %e, "Resync after rollback failed");
                    }
                }
            }
        }

        transfer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::config::NotificationConfig;
    use crate::guard::EditGuard;
    use crate::notify::Severity;
    use crate::testing::{fixtures, MockTicketApi, RecordingNotifier};

    struct Harness {
        api: Arc<MockTicketApi>,
        store: Arc<TicketStore>,
        notifier: Arc<RecordingNotifier>,
        coordinator: TransferCoordinator,
    }

    fn harness() -> Harness {
        let api = Arc::new(MockTicketApi::new());
        let store = Arc::new(TicketStore::new(api.clone(), EditGuard::new(), 25));
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = TransferCoordinator::new(
            store.clone(),
            api.clone(),
            fixtures::agent(),
            Notifications::new(notifier.clone(), NotificationConfig::default()),
        );
        Harness {
            api,
            store,
            notifier,
            coordinator,
        }
    }

    fn seed(h: &Harness, ids: &[&str]) {
        let tickets: Vec<_> = ids.iter().map(|id| fixtures::ticket(id)).collect();
        h.api.set_queue(QueueKind::Unassigned, tickets.clone());
        h.store
            .reconcile(QueueKind::Unassigned, fixtures::queue(tickets));
    }

    #[tokio::test]
    async fn test_commit_patches_from_server() {
        let h = harness();
        seed(&h, &["t-1", "t-2"]);

        let transfer = h
            .coordinator
            .transfer("t-1", QueueKind::Unassigned, QueueKind::Mine)
            .await
            .unwrap();

        assert_eq!(transfer.state, TransferState::Committed);
        let mine = h.store.snapshot(QueueKind::Mine);
        let ticket = mine.get("t-1").unwrap();
        assert_eq!(ticket.assignee_id.as_deref(), Some(fixtures::AGENT_ID));
        assert_eq!(ticket.assignee_name.as_deref(), Some(fixtures::AGENT_SERVER_NAME));
        assert_eq!(h.store.queues_containing("t-1"), vec![QueueKind::Mine]);
        assert_eq!(h.notifier.last_severity(), Some(Severity::Success));
        assert_eq!(h.api.assign_to_me_calls(), vec!["t-1".to_string()]);
    }

    #[tokio::test]
    async fn test_button_assignment_uses_assign_endpoint() {
        let h = harness();
        seed(&h, &["t-1"]);

        let transfer = h.coordinator.assign("t-1").await.unwrap();
        assert_eq!(transfer.trigger, TransferTrigger::Button);
        assert_eq!(transfer.state, TransferState::Committed);
        assert_eq!(h.api.assign_calls(), vec!["t-1".to_string()]);
        assert!(h.api.assign_to_me_calls().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_and_resyncs_source() {
        let h = harness();
        seed(&h, &["t-1", "t-2", "t-3"]);
        // Someone else claimed t-2 on the server.
        h.api.set_queue(
            QueueKind::Unassigned,
            vec![fixtures::ticket("t-1"), fixtures::ticket("t-3")],
        );
        h.api.fail_next_assign(ApiError::Conflict("taken".to_string()));

        let transfer = h
            .coordinator
            .transfer("t-2", QueueKind::Unassigned, QueueKind::Mine)
            .await
            .unwrap();

        assert_eq!(transfer.state, TransferState::RolledBack);
        assert!(transfer.was_conflict());
        assert_eq!(h.notifier.last_severity(), Some(Severity::Warning));
        assert!(h.store.queues_containing("t-2").is_empty());
        assert_eq!(h.store.snapshot(QueueKind::Unassigned).pagination.total_count, 2);
        assert_eq!(h.store.snapshot(QueueKind::Mine).pagination.total_count, 0);
    }

    #[tokio::test]
    async fn test_network_failure_rolls_back_without_resync() {
        let h = harness();
        seed(&h, &["t-1", "t-2"]);
        h.api.fail_next_assign(ApiError::Network("connection reset".to_string()));
        let lists_before = h.api.list_calls();

        let transfer = h
            .coordinator
            .transfer("t-1", QueueKind::Unassigned, QueueKind::Mine)
            .await
            .unwrap();

        assert_eq!(transfer.state, TransferState::RolledBack);
        assert!(!transfer.was_conflict());
        assert_eq!(h.notifier.last_severity(), Some(Severity::Error));
        assert_eq!(h.api.list_calls(), lists_before);
        let unassigned = h.store.snapshot(QueueKind::Unassigned);
        assert_eq!(unassigned.tickets[0].id, "t-1");
        assert_eq!(unassigned.pagination.total_count, 2);
    }

    #[tokio::test]
    async fn test_invalid_route_touches_nothing() {
        let h = harness();
        seed(&h, &["t-1"]);

        let err = h
            .coordinator
            .transfer("t-1", QueueKind::Mine, QueueKind::Unassigned)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidRoute { .. }));

        let err = h
            .coordinator
            .transfer("t-1", QueueKind::Unassigned, QueueKind::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidRoute { .. }));
        assert_eq!(h.store.snapshot(QueueKind::Unassigned).len(), 1);
        assert!(h.api.assign_to_me_calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_rejected() {
        let h = harness();
        seed(&h, &["t-1"]);
        let err = h.coordinator.assign("nope").await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::Store(StoreError::NotInQueue { .. })
        ));
    }

    #[tokio::test]
    async fn test_optimistic_state_visible_while_request_pending() {
        let h = harness();
        seed(&h, &["t-1", "t-2"]);
        h.api.pause_assignments();

        let pending = h
            .coordinator
            .begin("t-2", QueueKind::Unassigned, QueueKind::Mine, TransferTrigger::Drag)
            .unwrap();
        assert_eq!(pending.transfer().state, TransferState::Pending);

        let mut settle = tokio_test::task::spawn(pending.settle());
        tokio_test::assert_pending!(settle.poll());
        assert_eq!(h.api.assign_to_me_calls(), vec!["t-2".to_string()]);
        assert_eq!(h.store.snapshot(QueueKind::Unassigned).pagination.total_count, 1);
        assert_eq!(h.store.snapshot(QueueKind::Mine).pagination.total_count, 1);
        assert!(h.notifier.recorded().is_empty());

        h.api.resume_assignments();
        assert!(settle.is_woken());
        let transfer = tokio_test::assert_ready!(settle.poll());
        assert_eq!(transfer.state, TransferState::Committed);
        assert!(!h.store.is_pending("t-2"));
    }
}
