//! Ticket assignment transfers.
//!
//! A transfer moves a ticket from the unassigned pool into the agent's own
//! queue. The move is applied to the store before the assignment request is
//! sent, then either committed with the server's copy of the ticket or rolled
//! back. Conflicts (someone else claimed the ticket first) also force a
//! resync of the source queue.

mod coordinator;
mod types;

pub use coordinator::{PendingTransfer, TransferCoordinator};
pub use types::{Transfer, TransferError, TransferState, TransferTrigger};
