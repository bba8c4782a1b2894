//! Background polling of the active view.
//!
//! One timer is live at a time. Each tick asks the view's [`PollTarget`] for
//! a silent refresh, unless the view is being edited (the tick is dropped) or
//! the previous tick's poll has not finished yet (the tick is skipped).

mod scheduler;

pub use scheduler::{PollHandle, RefreshScheduler};

use async_trait::async_trait;

/// Something that can be refreshed silently in the background.
#[async_trait]
pub trait PollTarget: Send + Sync {
    /// Refresh without loading indicators.
    async fn poll(&self);
}
