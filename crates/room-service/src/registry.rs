//! Live connection registry.
//!
//! Tracks every open WebSocket connection by its [`ConnectionId`], the
//! sender half of its outbound queue, and the transport groups it has
//! joined. A transport group is the broadcast audience for a room ID.
//!
//! Group membership is independent of room participation: ending a meeting
//! deletes the room but leaves the connections in the group, so a later
//! join of the same room ID reaches them again. A connection leaves all of
//! its groups only when it is unregistered.

use crate::protocol::ServerEvent;
use common::types::{ConnectionId, RoomId};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;

#[derive(Debug)]
struct ConnectionEntry {
    outbound: mpsc::Sender<ServerEvent>,
    groups: BTreeSet<RoomId>,
}

/// Registry of live connections and their transport groups.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    /// Group members in the order they joined.
    groups: HashMap<RoomId, Vec<ConnectionId>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Re-registering an ID replaces its outbound
    /// sender and keeps its groups.
    pub fn register(&mut self, connection_id: ConnectionId, outbound: mpsc::Sender<ServerEvent>) {
        match self.connections.get_mut(&connection_id) {
            Some(entry) => entry.outbound = outbound,
            None => {
                self.connections.insert(
                    connection_id,
                    ConnectionEntry {
                        outbound,
                        groups: BTreeSet::new(),
                    },
                );
            }
        }
    }

    /// Remove a connection and take it out of every group it joined.
    ///
    /// Returns the groups the connection was in. Empty groups are dropped.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let Some(entry) = self.connections.remove(connection_id) else {
            return Vec::new();
        };

        for room_id in &entry.groups {
            if let Some(members) = self.groups.get_mut(room_id) {
                members.retain(|member| member != connection_id);
                if members.is_empty() {
                    self.groups.remove(room_id);
                }
            }
        }

        entry.groups.into_iter().collect()
    }

    /// Add a registered connection to a group.
    ///
    /// Returns `false` if the connection is not registered. Joining a group
    /// twice is a no-op.
    pub fn join_group(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        let Some(entry) = self.connections.get_mut(connection_id) else {
            return false;
        };

        if entry.groups.insert(room_id.clone()) {
            self.groups
                .entry(room_id.clone())
                .or_default()
                .push(connection_id.clone());
        }

        true
    }

    /// Members of a group, in the order they joined it.
    #[must_use]
    pub fn group_members(&self, room_id: &RoomId) -> &[ConnectionId] {
        self.groups.get(room_id).map_or(&[], Vec::as_slice)
    }

    /// Outbound sender for a connection, if it is still registered.
    #[must_use]
    pub fn outbound(&self, connection_id: &ConnectionId) -> Option<&mpsc::Sender<ServerEvent>> {
        self.connections
            .get(connection_id)
            .map(|entry| &entry.outbound)
    }

    #[must_use]
    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::from(id)
    }

    fn room(id: &str) -> RoomId {
        RoomId::from(id)
    }

    fn sender() -> mpsc::Sender<ServerEvent> {
        mpsc::channel(4).0
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("1"), sender());
        registry.register(conn("2"), sender());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&conn("1")));
        assert!(registry.outbound(&conn("1")).is_some());

        registry.unregister(&conn("1"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&conn("1")));
        assert!(registry.outbound(&conn("1")).is_none());
    }

    #[test]
    fn test_join_group_requires_registration() {
        let mut registry = ConnectionRegistry::new();
        assert!(!registry.join_group(&conn("ghost"), &room("r1")));
        assert!(registry.group_members(&room("r1")).is_empty());
    }

    #[test]
    fn test_group_members_in_join_order_without_duplicates() {
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("1"), sender());
        registry.register(conn("2"), sender());

        assert!(registry.join_group(&conn("2"), &room("r1")));
        assert!(registry.join_group(&conn("1"), &room("r1")));
        assert!(registry.join_group(&conn("2"), &room("r1")));

        assert_eq!(registry.group_members(&room("r1")), &[conn("2"), conn("1")]);
    }

    #[test]
    fn test_unregister_leaves_all_groups() {
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("1"), sender());
        registry.register(conn("2"), sender());
        registry.join_group(&conn("1"), &room("a"));
        registry.join_group(&conn("1"), &room("b"));
        registry.join_group(&conn("2"), &room("b"));

        let left = registry.unregister(&conn("1"));
        assert_eq!(left, vec![room("a"), room("b")]);

        assert!(registry.group_members(&room("a")).is_empty());
        assert_eq!(registry.group_members(&room("b")), &[conn("2")]);

        // Second unregister is a no-op
        assert!(registry.unregister(&conn("1")).is_empty());
    }

    #[test]
    fn test_reregister_keeps_groups() {
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("1"), sender());
        registry.join_group(&conn("1"), &room("r1"));

        registry.register(conn("1"), sender());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.group_members(&room("r1")), &[conn("1")]);
    }
}
