//! `SessionCoordinator` - the single owner of all room state.
//!
//! Every connection lifecycle change and inbound event goes through this
//! actor's mailbox and is handled to completion (store mutation plus the
//! resulting broadcasts) before the next message is taken. Handlers never
//! await, so no other event can observe a half-applied change.
//!
//! # Authority
//!
//! `kick-user` and `end-meeting` are honoured only when the sender is the
//! host of the room named in the event. Anything else is dropped without a
//! reply; operators see a `room.audit` warning and the
//! `room_authority_denied_total` counter.

use crate::dispatch::BroadcastDispatcher;
use crate::errors::RoomError;
use crate::observability::metrics;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::ConnectionRegistry;
use crate::rooms::{RoomChange, RoomSnapshot, RoomStore};

use super::messages::{CoordinatorMessage, CoordinatorStatus};
use super::metrics::MailboxMonitor;

use common::types::{ConnectionId, RoomId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Coordinator mailbox capacity. Senders wait when it is full.
const COORDINATOR_CHANNEL_BUFFER: usize = 1000;

/// Handle to the `SessionCoordinator`.
///
/// Cheap to clone; every WebSocket session holds one.
#[derive(Clone)]
pub struct SessionCoordinatorHandle {
    sender: mpsc::Sender<CoordinatorMessage>,
    cancel_token: CancellationToken,
    mailbox: Arc<MailboxMonitor>,
}

impl SessionCoordinatorHandle {
    /// Spawn the coordinator actor and return a handle to it.
    ///
    /// The coordinator owns the root cancellation token; cancelling it stops
    /// the actor and every session holding a child token.
    #[must_use]
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel(COORDINATOR_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();
        let mailbox = Arc::new(MailboxMonitor::new());

        let actor = SessionCoordinator::new(receiver, cancel_token.clone(), Arc::clone(&mailbox));
        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
            mailbox,
        }
    }

    /// Register a new connection. The coordinator answers on `outbound`
    /// with a `connected` event carrying the connection's ID.
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerEvent>,
    ) -> Result<(), RoomError> {
        self.send(CoordinatorMessage::Connect {
            connection_id,
            outbound,
        })
        .await
    }

    /// Forward an inbound event from a connection.
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        self.send(CoordinatorMessage::Inbound {
            connection_id,
            event,
        })
        .await
    }

    /// Report a closed connection. Safe to call more than once.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        self.send(CoordinatorMessage::Disconnect { connection_id })
            .await
    }

    /// Copy of a room's current state, or `None` if it does not exist.
    pub async fn get_room(&self, room_id: RoomId) -> Result<Option<RoomSnapshot>, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(CoordinatorMessage::GetRoom {
            room_id,
            respond_to: tx,
        })
        .await?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    pub async fn get_status(&self) -> Result<CoordinatorStatus, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.send(CoordinatorMessage::GetStatus { respond_to: tx })
            .await?;

        rx.await
            .map_err(|e| RoomError::Internal(format!("response receive failed: {e}")))
    }

    /// Stop the coordinator and everything holding a child token.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Child token for session tasks and the HTTP server.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    async fn send(&self, message: CoordinatorMessage) -> Result<(), RoomError> {
        self.mailbox.record_enqueue();
        if let Err(e) = self.sender.send(message).await {
            self.mailbox.record_rejected();
            return Err(RoomError::Internal(format!("channel send failed: {e}")));
        }
        Ok(())
    }
}

/// The coordinator actor. Owns the room store and connection registry.
pub struct SessionCoordinator {
    receiver: mpsc::Receiver<CoordinatorMessage>,
    cancel_token: CancellationToken,
    mailbox: Arc<MailboxMonitor>,
    rooms: RoomStore,
    registry: ConnectionRegistry,
}

impl SessionCoordinator {
    fn new(
        receiver: mpsc::Receiver<CoordinatorMessage>,
        cancel_token: CancellationToken,
        mailbox: Arc<MailboxMonitor>,
    ) -> Self {
        Self {
            receiver,
            cancel_token,
            mailbox,
            rooms: RoomStore::new(),
            registry: ConnectionRegistry::new(),
        }
    }

    #[instrument(skip_all, name = "room.actor.coordinator")]
    async fn run(mut self) {
        info!(target: "room.actor.coordinator", "SessionCoordinator started");

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "room.actor.coordinator",
                        "SessionCoordinator received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message);
                            self.mailbox.record_dequeue();
                        }
                        None => {
                            info!(
                                target: "room.actor.coordinator",
                                "SessionCoordinator channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "room.actor.coordinator",
            rooms_remaining = self.rooms.len(),
            connections_remaining = self.registry.len(),
            messages_processed = self.mailbox.messages_processed(),
            peak_mailbox_depth = self.mailbox.peak_depth(),
            "SessionCoordinator stopped"
        );
    }

    fn handle_message(&mut self, message: CoordinatorMessage) {
        match message {
            CoordinatorMessage::Connect {
                connection_id,
                outbound,
            } => self.handle_connect(connection_id, outbound),

            CoordinatorMessage::Inbound {
                connection_id,
                event,
            } => self.handle_inbound(&connection_id, event),

            CoordinatorMessage::Disconnect { connection_id } => {
                self.handle_disconnect(&connection_id);
            }

            CoordinatorMessage::GetRoom {
                room_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.rooms.snapshot(&room_id));
            }

            CoordinatorMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }
        }
    }

    fn handle_connect(&mut self, connection_id: ConnectionId, outbound: mpsc::Sender<ServerEvent>) {
        self.registry.register(connection_id.clone(), outbound);

        BroadcastDispatcher::new(&self.registry).send_to_connection(
            &connection_id,
            ServerEvent::Connected {
                id: connection_id.clone(),
            },
        );

        metrics::set_connections_active(self.registry.len());
        info!(
            target: "room.actor.coordinator",
            connection_id = %connection_id,
            connections = self.registry.len(),
            "Connection registered"
        );
    }

    fn handle_inbound(&mut self, connection_id: &ConnectionId, event: ClientEvent) {
        metrics::record_event(event.name());

        match event {
            ClientEvent::JoinRoom { room_id, user_name } => {
                self.join_room(connection_id, room_id, user_name);
            }
            ClientEvent::ChatMessage {
                room_id,
                message,
                user_name,
            } => self.relay_chat(&room_id, message, user_name),
            ClientEvent::KickUser { room_id, user_id } => {
                self.kick_user(connection_id, &room_id, &user_id);
            }
            ClientEvent::EndMeeting { room_id } => self.end_meeting(connection_id, &room_id),
        }
    }

    fn join_room(&mut self, connection_id: &ConnectionId, room_id: RoomId, user_name: String) {
        if !self.registry.join_group(connection_id, &room_id) {
            warn!(
                target: "room.actor.coordinator",
                connection_id = %connection_id,
                room_id = %room_id,
                "Join from unregistered connection ignored"
            );
            return;
        }

        let outcome = self
            .rooms
            .join(room_id.clone(), connection_id.clone(), user_name);

        if outcome.created {
            info!(
                target: "room.actor.coordinator",
                room_id = %room_id,
                host = %outcome.host,
                "Room created"
            );
            metrics::set_rooms_active(self.rooms.len());
        }

        debug!(
            target: "room.actor.coordinator",
            room_id = %room_id,
            connection_id = %connection_id,
            participants = outcome.participants.len(),
            "Participant joined"
        );

        let dispatcher = BroadcastDispatcher::new(&self.registry);
        dispatcher.broadcast_to_room(&room_id, &ServerEvent::Participants(outcome.participants));
        dispatcher.broadcast_to_room(&room_id, &ServerEvent::HostInfo(outcome.host));
    }

    fn relay_chat(&self, room_id: &RoomId, message: String, user_name: String) {
        BroadcastDispatcher::new(&self.registry)
            .broadcast_to_room(room_id, &ServerEvent::ChatMessage { message, user_name });
    }

    fn kick_user(&self, connection_id: &ConnectionId, room_id: &RoomId, target: &ConnectionId) {
        if !self.authorize_host(connection_id, room_id, "kick-user") {
            return;
        }

        let delivered =
            BroadcastDispatcher::new(&self.registry).send_to_connection(target, ServerEvent::Kicked);

        info!(
            target: "room.actor.coordinator",
            room_id = %room_id,
            host = %connection_id,
            kicked = %target,
            delivered,
            "Participant kicked"
        );
    }

    fn end_meeting(&mut self, connection_id: &ConnectionId, room_id: &RoomId) {
        if !self.authorize_host(connection_id, room_id, "end-meeting") {
            return;
        }

        let notified = BroadcastDispatcher::new(&self.registry)
            .broadcast_to_room(room_id, &ServerEvent::MeetingEnded);
        self.rooms.remove(room_id);
        metrics::set_rooms_active(self.rooms.len());

        info!(
            target: "room.actor.coordinator",
            room_id = %room_id,
            host = %connection_id,
            notified,
            "Meeting ended by host"
        );
    }

    fn handle_disconnect(&mut self, connection_id: &ConnectionId) {
        // Leave transport groups first so survivors' refreshed lists are not
        // sent to the departing connection.
        let was_registered = self.registry.contains(connection_id);
        self.registry.unregister(connection_id);
        let changes = self.rooms.remove_connection(connection_id);

        let dispatcher = BroadcastDispatcher::new(&self.registry);
        for change in &changes {
            match change {
                RoomChange::Deleted(room_id) => {
                    info!(
                        target: "room.actor.coordinator",
                        room_id = %room_id,
                        "Room emptied and deleted"
                    );
                }
                RoomChange::Updated {
                    room_id,
                    participants,
                } => {
                    dispatcher
                        .broadcast_to_room(room_id, &ServerEvent::Participants(participants.clone()));
                }
            }
        }

        metrics::set_rooms_active(self.rooms.len());
        metrics::set_connections_active(self.registry.len());

        if was_registered {
            info!(
                target: "room.actor.coordinator",
                connection_id = %connection_id,
                rooms_left = changes.len(),
                connections = self.registry.len(),
                "Connection unregistered"
            );
        }
    }

    /// Whether `connection_id` is the host of `room_id`. Logs and counts
    /// the denial otherwise.
    fn authorize_host(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        event: &'static str,
    ) -> bool {
        let reason = match self.rooms.get(room_id) {
            Some(room) if room.is_host(connection_id) => return true,
            Some(_) => "not_host",
            None => "unknown_room",
        };

        warn!(
            target: "room.audit",
            connection_id = %connection_id,
            room_id = %room_id,
            event,
            reason,
            "Host-only action denied"
        );
        metrics::record_authority_denied(event);
        false
    }

    fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            room_count: self.rooms.len(),
            connection_count: self.registry.len(),
            participant_count: self.rooms.participant_count(),
            // The status request itself is still counted as in flight.
            mailbox_depth: self.mailbox.current_depth().saturating_sub(1),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::rooms::Participant;

    struct Client {
        id: ConnectionId,
        rx: mpsc::Receiver<ServerEvent>,
    }

    impl Client {
        /// Everything queued for this client so far.
        fn drain(&mut self) -> Vec<ServerEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }
    }

    /// Wait until every message sent before this call has been handled.
    async fn sync(handle: &SessionCoordinatorHandle) {
        handle.get_status().await.unwrap();
    }

    async fn connect(handle: &SessionCoordinatorHandle, id: &str) -> Client {
        let (tx, rx) = mpsc::channel(64);
        let id = ConnectionId::from(id);
        handle.connect(id.clone(), tx).await.unwrap();
        sync(handle).await;

        let mut client = Client { id, rx };
        assert_eq!(
            client.drain(),
            vec![ServerEvent::Connected {
                id: client.id.clone()
            }]
        );
        client
    }

    async fn join(handle: &SessionCoordinatorHandle, client: &Client, room: &str, name: &str) {
        handle
            .dispatch(
                client.id.clone(),
                ClientEvent::JoinRoom {
                    room_id: RoomId::from(room),
                    user_name: name.to_string(),
                },
            )
            .await
            .unwrap();
    }

    fn participant(id: &str, name: &str) -> Participant {
        Participant {
            id: ConnectionId::from(id),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_two_participant_lifecycle() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut alice = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;

        join(&handle, &alice, "r1", "Alice").await;
        sync(&handle).await;
        assert_eq!(
            alice.drain(),
            vec![
                ServerEvent::Participants(vec![participant("1", "Alice")]),
                ServerEvent::HostInfo(ConnectionId::from("1")),
            ]
        );

        join(&handle, &bob, "r1", "Bob").await;
        sync(&handle).await;
        let expected = vec![
            ServerEvent::Participants(vec![participant("1", "Alice"), participant("2", "Bob")]),
            ServerEvent::HostInfo(ConnectionId::from("1")),
        ];
        assert_eq!(alice.drain(), expected);
        assert_eq!(bob.drain(), expected);

        handle.disconnect(alice.id.clone()).await.unwrap();
        let room = handle.get_room(RoomId::from("r1")).await.unwrap().unwrap();
        assert_eq!(room.participants, vec![participant("2", "Bob")]);
        assert_eq!(room.host, ConnectionId::from("1"));
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::Participants(vec![participant("2", "Bob")])]
        );
        // The departed connection hears nothing more
        assert!(alice.drain().is_empty());

        handle.disconnect(bob.id.clone()).await.unwrap();
        assert!(handle.get_room(RoomId::from("r1")).await.unwrap().is_none());

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.room_count, 0);
        assert_eq!(status.connection_count, 0);
    }

    #[tokio::test]
    async fn test_host_stays_first_joiner_after_host_leaves() {
        let handle = SessionCoordinatorHandle::spawn();
        let host = connect(&handle, "1").await;
        let bob = connect(&handle, "2").await;
        let mut carol = connect(&handle, "3").await;

        join(&handle, &host, "r1", "Host").await;
        join(&handle, &bob, "r1", "Bob").await;
        handle.disconnect(host.id.clone()).await.unwrap();
        join(&handle, &carol, "r1", "Carol").await;
        sync(&handle).await;

        let events = carol.drain();
        assert_eq!(
            events.last(),
            Some(&ServerEvent::HostInfo(ConnectionId::from("1")))
        );

        // Headless room: nobody can end it
        handle
            .dispatch(
                bob.id.clone(),
                ClientEvent::EndMeeting {
                    room_id: RoomId::from("r1"),
                },
            )
            .await
            .unwrap();
        assert!(handle.get_room(RoomId::from("r1")).await.unwrap().is_some());
        assert!(carol.drain().is_empty());
    }

    #[tokio::test]
    async fn test_non_host_kick_produces_no_events() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut host = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        let mut carol = connect(&handle, "3").await;
        join(&handle, &host, "r1", "Host").await;
        join(&handle, &bob, "r1", "Bob").await;
        join(&handle, &carol, "r1", "Carol").await;
        sync(&handle).await;
        host.drain();
        bob.drain();
        carol.drain();

        handle
            .dispatch(
                bob.id.clone(),
                ClientEvent::KickUser {
                    room_id: RoomId::from("r1"),
                    user_id: carol.id.clone(),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;

        assert!(host.drain().is_empty());
        assert!(bob.drain().is_empty());
        assert!(carol.drain().is_empty());
    }

    #[tokio::test]
    async fn test_host_kick_reaches_only_target() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut host = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        let mut carol = connect(&handle, "3").await;
        join(&handle, &host, "r1", "Host").await;
        join(&handle, &bob, "r1", "Bob").await;
        join(&handle, &carol, "r1", "Carol").await;
        sync(&handle).await;
        host.drain();
        bob.drain();
        carol.drain();

        handle
            .dispatch(
                host.id.clone(),
                ClientEvent::KickUser {
                    room_id: RoomId::from("r1"),
                    user_id: bob.id.clone(),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;

        assert_eq!(bob.drain(), vec![ServerEvent::Kicked]);
        assert!(host.drain().is_empty());
        assert!(carol.drain().is_empty());

        // Kick does not remove the target from the room
        let room = handle.get_room(RoomId::from("r1")).await.unwrap().unwrap();
        assert_eq!(room.participants.len(), 3);
    }

    #[tokio::test]
    async fn test_kick_in_unknown_room_is_ignored() {
        let handle = SessionCoordinatorHandle::spawn();
        let host = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        join(&handle, &host, "r1", "Host").await;

        handle
            .dispatch(
                host.id.clone(),
                ClientEvent::KickUser {
                    room_id: RoomId::from("other"),
                    user_id: bob.id.clone(),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;

        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_end_meeting_notifies_each_member_once() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut host = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        let mut outsider = connect(&handle, "3").await;
        join(&handle, &host, "r1", "Host").await;
        join(&handle, &bob, "r1", "Bob").await;
        // Duplicate join does not duplicate delivery
        join(&handle, &bob, "r1", "Bob").await;
        join(&handle, &outsider, "r2", "Out").await;
        sync(&handle).await;
        host.drain();
        bob.drain();
        outsider.drain();

        // Non-host attempt first
        handle
            .dispatch(
                bob.id.clone(),
                ClientEvent::EndMeeting {
                    room_id: RoomId::from("r1"),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;
        assert!(host.drain().is_empty());
        assert!(handle.get_room(RoomId::from("r1")).await.unwrap().is_some());

        handle
            .dispatch(
                host.id.clone(),
                ClientEvent::EndMeeting {
                    room_id: RoomId::from("r1"),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;

        assert_eq!(host.drain(), vec![ServerEvent::MeetingEnded]);
        assert_eq!(bob.drain(), vec![ServerEvent::MeetingEnded]);
        assert!(outsider.drain().is_empty());
        assert!(handle.get_room(RoomId::from("r1")).await.unwrap().is_none());
        assert!(handle.get_room(RoomId::from("r2")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejoin_after_end_meeting_creates_fresh_room() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut host = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        join(&handle, &host, "r1", "Host").await;
        join(&handle, &bob, "r1", "Bob").await;
        handle
            .dispatch(
                host.id.clone(),
                ClientEvent::EndMeeting {
                    room_id: RoomId::from("r1"),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;
        host.drain();
        bob.drain();

        join(&handle, &bob, "r1", "Bob").await;
        sync(&handle).await;

        let expected = vec![
            ServerEvent::Participants(vec![participant("2", "Bob")]),
            ServerEvent::HostInfo(ConnectionId::from("2")),
        ];
        assert_eq!(bob.drain(), expected);
        // Still in the transport group, so the old host hears it too
        assert_eq!(host.drain(), expected);
    }

    #[tokio::test]
    async fn test_disconnect_cleans_up_every_room() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut alice = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        join(&handle, &alice, "a", "Alice").await;
        join(&handle, &bob, "b", "Bob").await;
        join(&handle, &alice, "b", "Alice").await;
        sync(&handle).await;
        alice.drain();
        bob.drain();

        handle.disconnect(alice.id.clone()).await.unwrap();
        sync(&handle).await;

        assert!(handle.get_room(RoomId::from("a")).await.unwrap().is_none());
        let b = handle.get_room(RoomId::from("b")).await.unwrap().unwrap();
        assert_eq!(b.participants, vec![participant("2", "Bob")]);
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::Participants(vec![participant("2", "Bob")])]
        );
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let handle = SessionCoordinatorHandle::spawn();
        let alice = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        join(&handle, &alice, "r1", "Alice").await;
        join(&handle, &bob, "r1", "Bob").await;
        sync(&handle).await;
        bob.drain();

        handle.disconnect(alice.id.clone()).await.unwrap();
        handle.disconnect(alice.id.clone()).await.unwrap();
        handle
            .disconnect(ConnectionId::from("never-connected"))
            .await
            .unwrap();
        sync(&handle).await;

        assert_eq!(bob.drain().len(), 1);
        let status = handle.get_status().await.unwrap();
        assert_eq!(status.room_count, 1);
        assert_eq!(status.connection_count, 1);
        assert_eq!(status.participant_count, 1);
    }

    #[tokio::test]
    async fn test_chat_is_relayed_to_whole_room_including_sender() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut alice = connect(&handle, "1").await;
        let mut bob = connect(&handle, "2").await;
        let mut outsider = connect(&handle, "3").await;
        join(&handle, &alice, "r1", "Alice").await;
        join(&handle, &bob, "r1", "Bob").await;
        sync(&handle).await;
        alice.drain();
        bob.drain();
        outsider.drain();

        handle
            .dispatch(
                alice.id.clone(),
                ClientEvent::ChatMessage {
                    room_id: RoomId::from("r1"),
                    message: "hello".to_string(),
                    user_name: "Alice".to_string(),
                },
            )
            .await
            .unwrap();
        sync(&handle).await;

        let expected = vec![ServerEvent::ChatMessage {
            message: "hello".to_string(),
            user_name: "Alice".to_string(),
        }];
        assert_eq!(alice.drain(), expected);
        assert_eq!(bob.drain(), expected);
        assert!(outsider.drain().is_empty());

        // Chat never mutates the room
        let room = handle.get_room(RoomId::from("r1")).await.unwrap().unwrap();
        assert_eq!(room.participants.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_join_lists_connection_twice() {
        let handle = SessionCoordinatorHandle::spawn();
        let mut alice = connect(&handle, "1").await;
        join(&handle, &alice, "r1", "Alice").await;
        join(&handle, &alice, "r1", "Alice").await;
        sync(&handle).await;

        let events = alice.drain();
        assert_eq!(
            events[2],
            ServerEvent::Participants(vec![participant("1", "Alice"), participant("1", "Alice")])
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_coordinator() {
        let handle = SessionCoordinatorHandle::spawn();
        sync(&handle).await;
        assert!(!handle.is_cancelled());

        let child = handle.child_token();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(child.is_cancelled());

        assert!(handle.get_status().await.is_err());
    }
}
