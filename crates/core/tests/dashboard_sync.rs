//! Dashboard synchronisation integration tests.
//!
//! These tests drive a mounted dashboard against the mock ticket API:
//! optimistic transfers, conflict rollback, membership across queues,
//! filter races and background polling around edits.

use std::sync::Arc;
use std::time::Duration;

use triage_core::{
    api::ApiError,
    notify::Severity,
    testing::{fixtures, MemoryLocation, MockTicketApi, RecordingNotifier},
    transfer::TransferState,
    Dashboard, QueueKind, Ticket,
};

struct TestHarness {
    api: Arc<MockTicketApi>,
    notifier: Arc<RecordingNotifier>,
    location: Arc<MemoryLocation>,
    dashboard: Arc<Dashboard>,
}

impl TestHarness {
    fn new(query: &str) -> Self {
        let api = Arc::new(MockTicketApi::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let location = Arc::new(MemoryLocation::new(query));
        let dashboard = Dashboard::new(
            fixtures::config(),
            api.clone(),
            notifier.clone(),
            location.clone(),
        );
        Self {
            api,
            notifier,
            location,
            dashboard,
        }
    }

    /// Seed the server with `unassigned` and `mine` tickets and mount.
    async fn mounted(unassigned: usize, mine: usize) -> Self {
        let h = Self::new("");
        h.api.set_queue(QueueKind::Unassigned, tickets("t", unassigned));
        h.api.set_queue(QueueKind::Mine, tickets("m", mine));
        h.dashboard.mount().await;
        h
    }

    fn count(&self, kind: QueueKind) -> u64 {
        self.dashboard.snapshot(kind).pagination.total_count
    }

    /// Queues whose snapshot lists the ticket.
    fn holders(&self, ticket_id: &str) -> Vec<QueueKind> {
        QueueKind::ALL
            .into_iter()
            .filter(|k| self.dashboard.snapshot(*k).contains(ticket_id))
            .collect()
    }
}

fn tickets(prefix: &str, n: usize) -> Vec<Ticket> {
    (1..=n)
        .map(|i| fixtures::ticket(&format!("{}-{}", prefix, i)))
        .collect()
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_counts_move_before_the_server_answers() {
    let h = TestHarness::mounted(5, 2).await;
    assert_eq!(h.count(QueueKind::Unassigned), 5);
    assert_eq!(h.count(QueueKind::Mine), 2);

    h.api.pause_assignments();
    let dashboard = Arc::clone(&h.dashboard);
    let transfer = tokio::spawn(async move {
        dashboard
            .request_transfer("t-3", QueueKind::Unassigned, QueueKind::Mine)
            .await
    });
    settle().await;

    // Request sent, response held back.
    assert_eq!(h.api.assign_to_me_calls(), vec!["t-3".to_string()]);
    assert_eq!(h.count(QueueKind::Unassigned), 4);
    assert_eq!(h.count(QueueKind::Mine), 3);
    assert_eq!(h.holders("t-3"), vec![QueueKind::Mine]);
    let optimistic = h.dashboard.snapshot(QueueKind::Mine);
    assert_eq!(
        optimistic.get("t-3").and_then(|t| t.assignee_id.as_deref()),
        Some(fixtures::AGENT_ID)
    );

    h.api.resume_assignments();
    let transfer = transfer.await.unwrap().unwrap();
    assert_eq!(transfer.state, TransferState::Committed);
    assert_eq!(h.count(QueueKind::Unassigned), 4);
    assert_eq!(h.count(QueueKind::Mine), 3);
    let mine = h.dashboard.snapshot(QueueKind::Mine);
    assert_eq!(
        mine.get("t-3").and_then(|t| t.assignee_name.as_deref()),
        Some(fixtures::AGENT_SERVER_NAME)
    );
    assert_eq!(h.notifier.last_severity(), Some(Severity::Success));
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_conflict_rolls_back_and_resyncs() {
    let h = TestHarness::mounted(3, 1).await;
    let before = h.dashboard.snapshot(QueueKind::Unassigned);

    h.api.fail_next_assign(ApiError::Conflict("claimed by agent-2".to_string()));
    let transfer = h.dashboard.assign_to_me("t-2").await.unwrap();

    assert_eq!(transfer.state, TransferState::RolledBack);
    assert!(transfer.was_conflict());
    assert_eq!(h.notifier.last_severity(), Some(Severity::Warning));
    assert_eq!(h.dashboard.snapshot(QueueKind::Unassigned), before);
    assert_eq!(h.count(QueueKind::Mine), 1);
    assert_eq!(h.holders("t-2"), vec![QueueKind::Unassigned]);
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_network_failure_restores_original_position() {
    let h = TestHarness::mounted(4, 0).await;
    let before = h.dashboard.snapshot(QueueKind::Unassigned);

    h.api
        .fail_next_assign(ApiError::Network("connection reset".to_string()));
    let transfer = h
        .dashboard
        .request_transfer("t-3", QueueKind::Unassigned, QueueKind::Mine)
        .await
        .unwrap();

    assert_eq!(transfer.state, TransferState::RolledBack);
    assert_eq!(h.notifier.last_severity(), Some(Severity::Error));
    assert_eq!(h.dashboard.snapshot(QueueKind::Unassigned), before);
    assert!(h.dashboard.snapshot(QueueKind::Mine).is_empty());
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_every_ticket_lives_in_one_personal_queue() {
    let h = TestHarness::mounted(4, 1).await;

    h.dashboard.assign_to_me("t-1").await.unwrap();
    h.dashboard
        .request_transfer("t-4", QueueKind::Unassigned, QueueKind::Mine)
        .await
        .unwrap();
    h.api
        .fail_next_assign(ApiError::Conflict("taken".to_string()));
    h.dashboard.assign_to_me("t-2").await.unwrap();
    h.dashboard.refresh_now().await;

    for id in ["t-1", "t-2", "t-3", "t-4", "m-1"] {
        assert_eq!(h.holders(id).len(), 1, "{} should be in exactly one queue", id);
    }
    assert_eq!(h.holders("t-1"), vec![QueueKind::Mine]);
    assert_eq!(h.holders("t-2"), vec![QueueKind::Unassigned]);
    assert_eq!(
        h.count(QueueKind::Unassigned) + h.count(QueueKind::Mine),
        5
    );
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_invalid_route_is_rejected_without_changes() {
    let h = TestHarness::mounted(2, 2).await;

    let err = h
        .dashboard
        .request_transfer("m-1", QueueKind::Mine, QueueKind::Unassigned)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        triage_core::TransferError::InvalidRoute { .. }
    ));
    assert_eq!(h.count(QueueKind::Mine), 2);
    assert!(h.api.assign_calls().is_empty());
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_latest_page_change_wins() {
    let h = TestHarness::mounted(60, 0).await;
    h.api.pause_lists();

    let first = {
        let dashboard = Arc::clone(&h.dashboard);
        tokio::spawn(async move { dashboard.set_page(QueueKind::Unassigned, 2).await })
    };
    settle().await;
    let second = {
        let dashboard = Arc::clone(&h.dashboard);
        tokio::spawn(async move { dashboard.set_page(QueueKind::Unassigned, 3).await })
    };
    settle().await;

    h.api.resume_lists();
    assert!(first.await.unwrap());
    assert!(second.await.unwrap());

    let queue = h.dashboard.snapshot(QueueKind::Unassigned);
    assert_eq!(queue.pagination.page, 3);
    assert_eq!(queue.pagination.total_pages, 3);
    assert_eq!(queue.len(), 10);
    assert_eq!(h.location.current(), "u_page=3");
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_page_change_lands_even_if_a_transfer_commits_meanwhile() {
    let h = TestHarness::mounted(30, 0).await;
    h.api.pause_lists();

    let page_change = {
        let dashboard = Arc::clone(&h.dashboard);
        tokio::spawn(async move { dashboard.set_page(QueueKind::Unassigned, 2).await })
    };
    settle().await;

    let transfer = h
        .dashboard
        .request_transfer("t-3", QueueKind::Unassigned, QueueKind::Mine)
        .await
        .unwrap();
    assert_eq!(transfer.state, TransferState::Committed);

    h.api.resume_lists();
    assert!(page_change.await.unwrap());

    let queue = h.dashboard.snapshot(QueueKind::Unassigned);
    assert_eq!(queue.pagination.page, 2);
    assert_eq!(queue.pagination.total_count, 29);
    assert_eq!(queue.len(), 4);
    assert_eq!(h.dashboard.filters(QueueKind::Unassigned).page(), 2);
    assert_eq!(h.location.current(), "u_page=2");
    assert_eq!(h.holders("t-3"), vec![QueueKind::Mine]);
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_rollback_after_page_change_resyncs_instead_of_reinserting() {
    let h = TestHarness::mounted(30, 0).await;
    h.api.pause_assignments();

    let transfer = {
        let dashboard = Arc::clone(&h.dashboard);
        tokio::spawn(async move {
            dashboard
                .request_transfer("t-3", QueueKind::Unassigned, QueueKind::Mine)
                .await
        })
    };
    settle().await;
    assert_eq!(h.count(QueueKind::Unassigned), 29);

    assert!(h.dashboard.set_page(QueueKind::Unassigned, 2).await);
    assert_eq!(h.dashboard.snapshot(QueueKind::Unassigned).len(), 5);

    h.api
        .fail_next_assign(ApiError::Network("connection reset".to_string()));
    h.api.resume_assignments();
    let transfer = transfer.await.unwrap().unwrap();
    assert_eq!(transfer.state, TransferState::RolledBack);

    let queue = h.dashboard.snapshot(QueueKind::Unassigned);
    assert_eq!(queue.pagination.page, 2);
    assert_eq!(queue.pagination.total_count, 30);
    assert_eq!(queue.len(), 5);
    assert!(!queue.contains("t-3"));
    assert!(h.holders("t-3").is_empty());
    assert_eq!(h.count(QueueKind::Mine), 0);
    let (kind, query) = h.api.list_calls().pop().unwrap();
    assert_eq!((kind, query.page), (QueueKind::Unassigned, 2));
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_page_size_change_recomputes_pages() {
    let h = TestHarness::new("");
    h.api.set_queue(QueueKind::Mine, tickets("m", 30));
    h.dashboard.mount().await;

    let mine = h.dashboard.snapshot(QueueKind::Mine);
    assert_eq!(mine.pagination.total_pages, 2);

    h.dashboard.set_page(QueueKind::Mine, 2).await;
    h.dashboard.set_page_size(QueueKind::Mine, 50).await;

    let mine = h.dashboard.snapshot(QueueKind::Mine);
    assert_eq!(mine.pagination.page, 1);
    assert_eq!(mine.pagination.total_pages, 1);
    assert_eq!(mine.len(), 30);
    assert_eq!(h.location.current(), "m_limit=50");
    h.dashboard.unmount();
}

#[tokio::test]
async fn test_reload_restores_view_from_location() {
    let h = TestHarness::new("?tab=closed&c_sort=priority&c_page=2");
    h.dashboard.mount().await;

    assert_eq!(h.dashboard.tab(), triage_core::Tab::Closed);
    let calls = h.api.list_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, QueueKind::Closed);
    assert_eq!(calls[0].1.page, 2);
    assert_eq!(
        h.dashboard.url_state().to_query(25),
        "tab=closed&c_page=2&c_sort=priority"
    );
    h.dashboard.unmount();
}

#[tokio::test(start_paused = true)]
async fn test_background_poll_waits_for_edit_to_finish() {
    let h = TestHarness::mounted(2, 0).await;
    h.dashboard.begin_edit();
    h.api.set_queue(QueueKind::Unassigned, tickets("t", 3));

    tokio::time::advance(Duration::from_secs(31)).await;
    settle().await;
    assert_eq!(h.count(QueueKind::Unassigned), 2);

    h.dashboard.end_edit();
    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(h.count(QueueKind::Unassigned), 3);
    h.dashboard.unmount();
}

#[tokio::test(start_paused = true)]
async fn test_background_poll_picks_up_server_changes() {
    let h = TestHarness::mounted(1, 1).await;
    let calls_after_mount = h.api.list_calls().len();

    // Another agent claimed t-1; the server now lists it elsewhere.
    h.api.set_queue(QueueKind::Unassigned, Vec::new());
    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;

    assert_eq!(h.api.list_calls().len(), calls_after_mount + 2);
    assert!(h.dashboard.snapshot(QueueKind::Unassigned).is_empty());
    assert!(h.notifier.recorded().is_empty());
    h.dashboard.unmount();
}
