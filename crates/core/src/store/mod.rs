//! Client-side snapshot of the ticket queues.
//!
//! Queue contents only change through [`TicketStore`]: full loads, background
//! reconciliation and the optimistic transfer path. Each queue carries a
//! revision that every mutation bumps; a response dispatched under an older
//! revision is discarded instead of overwriting newer local state.

mod ticket_store;
mod types;

pub use ticket_store::TicketStore;
pub use types::{
    ReconcileOutcome, RefreshMode, RevertOutcome, StoreError, TicketPatch, TransferReceipt,
};
