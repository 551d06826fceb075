//! Room store: the authoritative membership and host state per room.
//!
//! Owned exclusively by the `SessionCoordinator` actor. Nothing outside the
//! actor holds a reference into it; queries return [`RoomSnapshot`] copies.
//!
//! # Invariants
//!
//! - A room is present only while it has at least one participant, except
//!   that the host may end a room that still has participants.
//! - The host is the first joiner and never changes. If the host disconnects
//!   the room keeps running without one ("headless") until it empties.
//! - Participants are kept in join order.
//! - Repeated joins are appended, not de-duplicated: a connection that joins
//!   the same room twice is listed twice until it disconnects.

use common::types::{ConnectionId, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named, connection-bound member of a room.
///
/// Serialized on the wire as `{"id": ..., "name": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: String,
}

/// State of one room.
#[derive(Debug)]
pub struct Room {
    host: ConnectionId,
    participants: Vec<Participant>,
}

impl Room {
    fn new(host: ConnectionId) -> Self {
        Self {
            host,
            participants: Vec::new(),
        }
    }

    /// Connection that created the room.
    #[must_use]
    pub fn host(&self) -> &ConnectionId {
        &self.host
    }

    #[must_use]
    pub fn is_host(&self, connection_id: &ConnectionId) -> bool {
        &self.host == connection_id
    }

    /// Participants in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Remove every entry for `connection_id`. Returns whether any matched.
    fn remove_connection(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| &p.id != connection_id);
        self.participants.len() != before
    }
}

/// Copy of a room's state handed to callers outside the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub host: ConnectionId,
    pub participants: Vec<Participant>,
}

/// Outcome of removing a connection from one room it was part of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomChange {
    /// The room lost its last participant and was deleted.
    Deleted(RoomId),
    /// The room still has participants; carries the refreshed list.
    Updated {
        room_id: RoomId,
        participants: Vec<Participant>,
    },
}

/// Outcome of a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Whether this join created the room.
    pub created: bool,
    pub host: ConnectionId,
    /// Full participant list after the join, in join order.
    pub participants: Vec<Participant>,
}

/// In-memory mapping from room ID to room state.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
}

impl RoomStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Number of live rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Append a participant, creating the room with `connection_id` as host
    /// if it does not exist yet.
    pub fn join(
        &mut self,
        room_id: RoomId,
        connection_id: ConnectionId,
        name: String,
    ) -> JoinOutcome {
        let created = !self.rooms.contains_key(&room_id);
        let room = self
            .rooms
            .entry(room_id)
            .or_insert_with(|| Room::new(connection_id.clone()));

        room.participants.push(Participant {
            id: connection_id,
            name,
        });

        JoinOutcome {
            created,
            host: room.host.clone(),
            participants: room.participants.clone(),
        }
    }

    /// Delete a room. Returns the removed room, if it existed.
    pub fn remove(&mut self, room_id: &RoomId) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    /// Remove `connection_id` from every room.
    ///
    /// Scans the whole store (rooms x participants). Rooms left empty are
    /// deleted. Only rooms that actually contained the connection produce a
    /// [`RoomChange`]; a connection that is in no room yields an empty list.
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> Vec<RoomChange> {
        let mut changes = Vec::new();

        for (room_id, room) in &mut self.rooms {
            if !room.remove_connection(connection_id) {
                continue;
            }

            if room.is_empty() {
                changes.push(RoomChange::Deleted(room_id.clone()));
            } else {
                changes.push(RoomChange::Updated {
                    room_id: room_id.clone(),
                    participants: room.participants.clone(),
                });
            }
        }

        self.rooms.retain(|_, room| !room.is_empty());

        changes
    }

    /// Copy of a room's current state.
    #[must_use]
    pub fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        self.rooms.get(room_id).map(|room| RoomSnapshot {
            room_id: room_id.clone(),
            host: room.host.clone(),
            participants: room.participants.clone(),
        })
    }

    /// Total participant entries across all rooms.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.rooms.values().map(|room| room.participants.len()).sum()
    }
}
