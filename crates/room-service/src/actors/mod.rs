//! Actor layer of the Room Service.
//!
//! ```text
//! SessionCoordinator (singleton per process)
//! ├── owns RoomStore
//! ├── owns ConnectionRegistry
//! └── fed by N connection session tasks (one per WebSocket)
//! ```
//!
//! Connection tasks never touch room state; they forward inbound events and
//! their own disconnect to the coordinator's mailbox and drain their
//! outbound queue to the socket.
//!
//! # Modules
//!
//! - [`coordinator`] - `SessionCoordinator` actor and its handle
//! - [`messages`] - Mailbox message types
//! - [`metrics`] - Mailbox depth monitoring

pub mod coordinator;
pub mod messages;
pub mod metrics;

pub use coordinator::{SessionCoordinator, SessionCoordinatorHandle};
pub use messages::{CoordinatorMessage, CoordinatorStatus};
pub use metrics::MailboxMonitor;
