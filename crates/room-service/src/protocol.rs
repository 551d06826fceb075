//! Wire events exchanged over the room WebSocket.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`; events without a payload omit
//! `data`. Field names inside payloads are camelCase.
//!
//! | Direction | Event | Payload |
//! |-----------|-------|---------|
//! | in  | `join-room` | `{roomId, userName}` |
//! | in  | `chat-message` | `{roomId, message, userName}` |
//! | in  | `kick-user` | `{roomId, userId}` |
//! | in  | `end-meeting` | `{roomId}` |
//! | out | `connected` | `{id}` (sent once, to the new connection) |
//! | out | `participants` | `[{id, name}, ...]` |
//! | out | `host-info` | host connection id |
//! | out | `chat-message` | `{message, userName}` |
//! | out | `kicked` | none |
//! | out | `meeting-ended` | none |

use crate::rooms::Participant;
use common::types::{ConnectionId, RoomId};
use serde::{Deserialize, Serialize};

/// Inbound event from a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: RoomId,
        #[serde(default)]
        user_name: String,
    },

    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_id: RoomId,
        #[serde(default)]
        message: String,
        #[serde(default)]
        user_name: String,
    },

    #[serde(rename_all = "camelCase")]
    KickUser {
        room_id: RoomId,
        user_id: ConnectionId,
    },

    #[serde(rename_all = "camelCase")]
    EndMeeting { room_id: RoomId },
}

impl ClientEvent {
    /// Wire name of the event, also used as a bounded metric label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom { .. } => "join-room",
            ClientEvent::ChatMessage { .. } => "chat-message",
            ClientEvent::KickUser { .. } => "kick-user",
            ClientEvent::EndMeeting { .. } => "end-meeting",
        }
    }

    /// Room the event is scoped to.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        match self {
            ClientEvent::JoinRoom { room_id, .. }
            | ClientEvent::ChatMessage { room_id, .. }
            | ClientEvent::KickUser { room_id, .. }
            | ClientEvent::EndMeeting { room_id } => room_id,
        }
    }

    /// Parse a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Outbound event to one or more client connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Tells a fresh connection its own identifier.
    Connected { id: ConnectionId },

    /// Full participant list of a room, in join order.
    Participants(Vec<Participant>),

    /// Host connection of a room.
    HostInfo(ConnectionId),

    #[serde(rename_all = "camelCase")]
    ChatMessage { message: String, user_name: String },

    Kicked,

    MeetingEnded,
}

impl ServerEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::Participants(_) => "participants",
            ServerEvent::HostInfo(_) => "host-info",
            ServerEvent::ChatMessage { .. } => "chat-message",
            ServerEvent::Kicked => "kicked",
            ServerEvent::MeetingEnded => "meeting-ended",
        }
    }

    /// Serialize into a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
