//! Messages sent to the `SessionCoordinator`.
//!
//! Connection lifecycle and inbound events are fire-and-forget; queries use
//! a `oneshot` reply channel.

use crate::protocol::{ClientEvent, ServerEvent};
use crate::rooms::RoomSnapshot;
use common::types::{ConnectionId, RoomId};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum CoordinatorMessage {
    /// A WebSocket connection opened. `outbound` is drained by the
    /// connection's writer task.
    Connect {
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerEvent>,
    },

    /// A parsed event arrived on a connection.
    Inbound {
        connection_id: ConnectionId,
        event: ClientEvent,
    },

    /// A WebSocket connection closed, cleanly or not.
    Disconnect { connection_id: ConnectionId },

    /// Copy of one room's state.
    GetRoom {
        room_id: RoomId,
        respond_to: oneshot::Sender<Option<RoomSnapshot>>,
    },

    GetStatus {
        respond_to: oneshot::Sender<CoordinatorStatus>,
    },
}

/// Point-in-time counters reported by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub room_count: usize,
    pub connection_count: usize,
    /// Participant entries across all rooms, duplicates included.
    pub participant_count: usize,
    /// Messages waiting in the coordinator mailbox.
    pub mailbox_depth: usize,
}
