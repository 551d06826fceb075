//! Broadcast dispatcher.
//!
//! Delivers outbound events to one connection or to every member of a
//! transport group. Delivery never awaits: each connection has a bounded
//! queue drained by its own writer task, and an event that does not fit is
//! dropped for that connection only. A closed queue means the connection is
//! already going away and its disconnect is on the way to the coordinator.

use crate::observability::metrics;
use crate::protocol::ServerEvent;
use crate::registry::ConnectionRegistry;
use common::types::{ConnectionId, RoomId};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Borrowing view over the registry used to fan events out.
pub struct BroadcastDispatcher<'a> {
    registry: &'a ConnectionRegistry,
}

impl<'a> BroadcastDispatcher<'a> {
    #[must_use]
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Send `event` to every member of the room's transport group.
    ///
    /// Returns how many connections accepted the event.
    pub fn broadcast_to_room(&self, room_id: &RoomId, event: &ServerEvent) -> usize {
        let mut delivered = 0;

        for connection_id in self.registry.group_members(room_id) {
            if let Some(outbound) = self.registry.outbound(connection_id) {
                if deliver(outbound, connection_id, event.clone()) {
                    delivered += 1;
                }
            }
        }

        debug!(
            target: "room.dispatch",
            room_id = %room_id,
            event = event.name(),
            delivered,
            "Broadcast to room"
        );

        delivered
    }

    /// Send `event` to a single connection. Returns `false` if the
    /// connection is unknown or its queue did not accept the event.
    pub fn send_to_connection(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        match self.registry.outbound(connection_id) {
            Some(outbound) => deliver(outbound, connection_id, event),
            None => {
                debug!(
                    target: "room.dispatch",
                    connection_id = %connection_id,
                    event = event.name(),
                    "Target connection not registered"
                );
                false
            }
        }
    }
}

fn deliver(
    outbound: &mpsc::Sender<ServerEvent>,
    connection_id: &ConnectionId,
    event: ServerEvent,
) -> bool {
    match outbound.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!(
                target: "room.dispatch",
                connection_id = %connection_id,
                event = event.name(),
                "Outbound queue full, dropping event"
            );
            metrics::record_broadcast_dropped();
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
