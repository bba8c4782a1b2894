//! Dashboard lifecycle: queues, filters, transfers, URL state and polling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::api::TicketApi;
use crate::config::Config;
use crate::detail::{DetailContext, TicketDetailView};
use crate::filter::{DateRange, FilterState, QueueFilterState, SortKey};
use crate::guard::{EditGuard, EditKind, ViewId};
use crate::notify::{Notifications, Notifier};
use crate::refresh::{PollTarget, RefreshScheduler};
use crate::store::{ReconcileOutcome, RefreshMode, StoreError, TicketStore};
use crate::ticket::{Queue, QueueKind, TicketStatus};
use crate::transfer::{Transfer, TransferCoordinator, TransferError};
use crate::url_state::{DashboardUrlState, LocationBar, Tab, UrlStateSync};

struct DashboardState {
    tab: Tab,
    filters: FilterState,
    url: UrlStateSync,
    mounted: bool,
}

/// The agent's queue dashboard.
pub struct Dashboard {
    config: Config,
    api: Arc<dyn TicketApi>,
    guard: EditGuard,
    store: Arc<TicketStore>,
    scheduler: Arc<RefreshScheduler>,
    coordinator: TransferCoordinator,
    notifications: Notifications,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new(
        config: Config,
        api: Arc<dyn TicketApi>,
        notifier: Arc<dyn Notifier>,
        location: Arc<dyn LocationBar>,
    ) -> Arc<Self> {
        let guard = EditGuard::new();
        let page_size = config.filters.default_page_size;
        let notifications = Notifications::new(notifier, config.notifications.clone());
        let store = Arc::new(TicketStore::new(Arc::clone(&api), guard.clone(), page_size));
        let coordinator = TransferCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&api),
            config.agent.clone(),
            notifications.clone(),
        );
        let state = DashboardState {
            tab: Tab::default(),
            filters: FilterState::new(page_size, config.filters.search_debounce()),
            url: UrlStateSync::new(location, page_size, config.filters.max_page_size),
            mounted: false,
        };

        Arc::new(Self {
            scheduler: Arc::new(RefreshScheduler::new(guard.clone())),
            config,
            api,
            guard,
            store,
            coordinator,
            notifications,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore state from the location, load the visible queues and start
    /// the background poll.
    pub async fn mount(self: &Arc<Self>) {
        let tab = {
            let mut state = self.lock();
            let restored = state.url.mount();
            restored.apply_to(&mut state.filters);
            state.tab = restored.tab;
            state.mounted = true;
            restored.tab
        };
        info!(tab = %tab, "Dashboard mounted");

        self.load_all(tab.kinds()).await;
        self.start_polling(tab);
    }

    /// Stop polling and drop pending edits. Responses still in flight are
    /// applied to the store but nothing is pushed to the location.
    pub fn unmount(&self) {
        {
            let mut state = self.lock();
            state.mounted = false;
            state.url.unmount();
        }
        self.scheduler.stop(&ViewId::Dashboard);
        self.guard.clear(&ViewId::Dashboard);
        info!("Dashboard unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    fn start_polling(&self, tab: Tab) {
        let poller = Arc::new(QueuePoller {
            store: Arc::clone(&self.store),
            kinds: tab.kinds().to_vec(),
        });
        self.scheduler.start(
            ViewId::Dashboard,
            self.config.refresh.dashboard_interval(),
            poller,
        );
    }

    /// Switch tabs, loading the queues the new tab shows.
    pub async fn set_tab(&self, tab: Tab) {
        let mounted = {
            let mut state = self.lock();
            if state.tab == tab {
                return;
            }
            state.tab = tab;
            Self::push_url(&mut state);
            state.mounted
        };
        debug!(tab = %tab, "Switched tab");

        self.load_all(tab.kinds()).await;
        if mounted {
            self.start_polling(tab);
        }
    }

    // Filters

    /// Record a search keystroke. The search commits once typing pauses for
    /// the configured delay.
    pub fn input_search(self: &Arc<Self>, kind: QueueKind, text: impl Into<String>) {
        let deadline = self
            .lock()
            .filters
            .get_mut(kind)
            .input_search(text, Instant::now());

        let dashboard: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(dashboard) = dashboard.upgrade() {
                dashboard.commit_search(kind).await;
            }
        });
    }

    /// Commit the pending search of a queue if its delay has elapsed.
    pub async fn commit_search(&self, kind: QueueKind) -> bool {
        self.change_filter(kind, |f| f.commit_search_if_due(Instant::now()))
            .await
    }

    pub async fn set_sort(&self, kind: QueueKind, sort: SortKey) -> bool {
        self.change_filter(kind, |f| f.set_sort(sort)).await
    }

    pub async fn set_status_filter(&self, kind: QueueKind, status: Option<TicketStatus>) -> bool {
        self.change_filter(kind, |f| f.set_status(status)).await
    }

    pub async fn set_date_range(&self, range: DateRange) -> bool {
        self.change_filter(QueueKind::Closed, |f| f.set_date_range(range))
            .await
    }

    pub async fn set_page(&self, kind: QueueKind, page: u32) -> bool {
        self.change_filter(kind, |f| f.set_page(page)).await
    }

    /// Change a queue's page size, capped at the configured maximum.
    pub async fn set_page_size(&self, kind: QueueKind, page_size: u32) -> bool {
        let page_size = page_size.clamp(1, self.config.filters.max_page_size);
        self.change_filter(kind, |f| f.set_page_size(page_size))
            .await
    }

    async fn change_filter<F>(&self, kind: QueueKind, change: F) -> bool
    where
        F: FnOnce(&mut QueueFilterState) -> bool,
    {
        {
            let mut state = self.lock();
            if !change(state.filters.get_mut(kind)) {
                return false;
            }
            Self::push_url(&mut state);
        }
        self.load(kind).await;
        true
    }

    fn push_url(state: &mut DashboardState) {
        let snapshot = DashboardUrlState::from_filters(state.tab, &state.filters);
        state.url.push(&snapshot);
    }

    // Loading

    async fn load(&self, kind: QueueKind) {
        let query = self.lock().filters.get(kind).list_query();
        match self.store.load(kind, query).await {
            Ok(queue) => {
                debug!(queue = %kind, total = queue.pagination.total_count, "Queue loaded");
            }
            Err(StoreError::Superseded(_)) => {}
            Err(e) => {
                error!(queue = %kind, error = %e, "Failed to load queue");
                self.notifications
                    .error(&format!("Could not load {} tickets", kind));
            }
        }
    }

    async fn load_all(&self, kinds: &[QueueKind]) {
        join_all(kinds.iter().map(|kind| self.load(*kind))).await;
    }

    /// Fetch the visible queues now, ignoring edits in progress.
    pub async fn refresh_now(&self) {
        let tab = self.lock().tab;
        let results = join_all(
            tab.kinds()
                .iter()
                .map(|kind| self.store.refresh(*kind, RefreshMode::Forced)),
        )
        .await;
        for (kind, result) in tab.kinds().iter().zip(results) {
            if let Err(e) = result {
                error!(queue = %kind, error = %e, "Forced refresh failed");
                self.notifications
                    .error(&format!("Could not refresh {} tickets", kind));
            }
        }
    }

    // Transfers and edits

    /// Move a dragged ticket from one queue onto another.
    pub async fn request_transfer(
        &self,
        ticket_id: &str,
        source: QueueKind,
        target: QueueKind,
    ) -> Result<Transfer, TransferError> {
        self.coordinator.transfer(ticket_id, source, target).await
    }

    /// Assign an unassigned ticket to the acting agent.
    pub async fn assign_to_me(&self, ticket_id: &str) -> Result<Transfer, TransferError> {
        self.coordinator.assign(ticket_id).await
    }

    pub fn coordinator(&self) -> &TransferCoordinator {
        &self.coordinator
    }

    /// An editable dashboard field gained focus.
    pub fn begin_edit(&self) {
        self.guard.begin(&ViewId::Dashboard, EditKind::Field);
    }

    pub fn end_edit(&self) {
        self.guard.end(&ViewId::Dashboard, EditKind::Field);
    }

    // Detail navigation

    /// Build the detail view for a ticket. Opening it takes over the poll
    /// timer; call [`Dashboard::resume`] when returning to the list.
    pub fn open_ticket(&self, ticket_id: &str) -> Arc<TicketDetailView> {
        let ctx = DetailContext {
            api: Arc::clone(&self.api),
            guard: self.guard.clone(),
            scheduler: Arc::clone(&self.scheduler),
            notifications: self.notifications.clone(),
            poll_interval: self.config.refresh.detail_interval(),
        };
        TicketDetailView::new(ticket_id, ctx)
    }

    /// Return to the dashboard from a detail view.
    pub async fn resume(&self) {
        let (tab, mounted) = {
            let state = self.lock();
            (state.tab, state.mounted)
        };
        if !mounted {
            return;
        }
        self.start_polling(tab);
        QueuePoller {
            store: Arc::clone(&self.store),
            kinds: tab.kinds().to_vec(),
        }
        .poll()
        .await;
    }

    // Accessors

    pub fn snapshot(&self, kind: QueueKind) -> Queue {
        self.store.snapshot(kind)
    }

    pub fn tab(&self) -> Tab {
        self.lock().tab
    }

    pub fn filters(&self, kind: QueueKind) -> QueueFilterState {
        self.lock().filters.get(kind).clone()
    }

    pub fn url_state(&self) -> DashboardUrlState {
        let state = self.lock();
        DashboardUrlState::from_filters(state.tab, &state.filters)
    }

    pub fn guard(&self) -> &EditGuard {
        &self.guard
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }
}

/// Silent refresh of the queues on the visible tab.
struct QueuePoller {
    store: Arc<TicketStore>,
    kinds: Vec<QueueKind>,
}

#[async_trait]
impl PollTarget for QueuePoller {
    async fn poll(&self) {
        let results = join_all(
            self.kinds
                .iter()
                .map(|kind| self.store.refresh(*kind, RefreshMode::Silent)),
        )
        .await;
        for (kind, result) in self.kinds.iter().zip(results) {
            match result {
                Ok(ReconcileOutcome::Applied) => {}
                Ok(outcome) => debug!(queue = %kind, ?outcome, "Silent refresh not applied"),
                // Background failures stay quiet; the next tick retries.
                Err(e) => error!(queue = %kind, error = %e, "Silent refresh failed"),
            }
        }
    }
}
