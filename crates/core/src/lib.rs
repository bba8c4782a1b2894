pub mod activity;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod detail;
pub mod filter;
pub mod guard;
pub mod notify;
pub mod refresh;
pub mod store;
pub mod testing;
pub mod ticket;
pub mod transfer;
pub mod url_state;

pub use api::{ApiError, HttpTicketApi, TicketApi};
pub use config::{
    load_config, load_config_from_str, validate_config, AgentConfig, Config, ConfigError,
    SanitizedConfig,
};
pub use dashboard::Dashboard;
pub use detail::{DetailError, Navigation, TicketDetailView};
pub use guard::{EditGuard, EditKind, ViewId};
pub use notify::{NotificationCenter, Notifier, Severity};
pub use store::{StoreError, TicketStore};
pub use ticket::{QueueKind, Ticket, TicketDetail, TicketStatus};
pub use transfer::{Transfer, TransferCoordinator, TransferError};
pub use url_state::{LocationBar, Tab};
