//! Refresh scheduler implementation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::guard::{EditGuard, ViewId};

use super::PollTarget;

/// A running poll timer for one view.
///
/// Dropping the handle (or calling [`PollHandle::stop`]) cancels the timer.
/// Polls already in flight are left to finish; their targets decide whether
/// the results are still wanted.
pub struct PollHandle {
    view: ViewId,
    interval: Duration,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Spawn the timer task.
    pub fn start(
        view: ViewId,
        interval: Duration,
        guard: EditGuard,
        target: Arc<dyn PollTarget>,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let task_view = view.clone();
        let first_tick = Instant::now() + interval;

        let task = tokio::spawn(async move {
            let view = task_view;
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut outstanding: Option<JoinHandle<()>> = None;

            debug!(view = %view, interval_ms = interval.as_millis() as u64, "Poll timer started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!(view = %view, "Poll timer received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if guard.is_active(&view) {
                            debug!(view = %view, "Edit in progress, dropping tick");
                            continue;
                        }
                        if outstanding.as_ref().is_some_and(|h| !h.is_finished()) {
                            debug!(view = %view, "Previous poll still outstanding, skipping tick");
                            continue;
                        }
                        let target = Arc::clone(&target);
                        outstanding = Some(tokio::spawn(async move { target.poll().await }));
                    }
                }
            }
        });

        Self {
            view,
            interval,
            shutdown_tx,
            task,
        }
    }

    pub fn view(&self) -> &ViewId {
        &self.view
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the timer.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        self.task.abort();
    }
}

/// Owner of the single live poll timer.
pub struct RefreshScheduler {
    guard: EditGuard,
    current: Mutex<Option<PollHandle>>,
}

impl RefreshScheduler {
    pub fn new(guard: EditGuard) -> Self {
        Self {
            guard,
            current: Mutex::new(None),
        }
    }

    /// Start polling a view, cancelling whichever view was polled before.
    pub fn start(&self, view: ViewId, interval: Duration, target: Arc<dyn PollTarget>) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            info!(previous = %previous.view(), next = %view, "Switching poll timer");
            previous.stop();
        } else {
            info!(view = %view, "Starting poll timer");
        }
        *current = Some(PollHandle::start(view, interval, self.guard.clone(), target));
    }

    /// Stop the timer if it belongs to `view`.
    pub fn stop(&self, view: &ViewId) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|h| h.view() == view) {
            if let Some(handle) = current.take() {
                info!(view = %view, "Stopping poll timer");
                handle.stop();
            }
            true
        } else {
            false
        }
    }

    /// Stop whatever timer is running.
    pub fn stop_all(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = current.take() {
            info!(view = %handle.view(), "Stopping poll timer");
            handle.stop();
        }
    }

    /// The view currently being polled.
    pub fn active_view(&self) -> Option<ViewId> {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|h| h.view().clone())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}
