//! Room Service Library
//!
//! Core of the Huddle room service - a real-time session coordinator for
//! multi-party audio/video rooms:
//!
//! - Authoritative room membership and host state, kept in memory
//! - Event-driven broadcast protocol over WebSocket connections
//! - Short-lived access tokens for the external media transport
//!
//! # Architecture
//!
//! ```text
//! axum (HTTP + WebSocket)
//! ├── /getToken ──> TokenIssuer (stateless, outside the coordinator)
//! └── /ws ──> connection session task (one per WebSocket)
//!              │  inbound events, disconnect
//!              ▼
//!     SessionCoordinator (single actor task)
//!     ├── owns RoomStore          (room -> host + ordered participants)
//!     ├── owns ConnectionRegistry (live connections + transport groups)
//!     └── BroadcastDispatcher ──> per-connection outbound queues
//! ```
//!
//! Every inbound event is processed to completion by the coordinator before
//! the next one, so membership changes and the broadcasts they cause are
//! atomic with respect to each other. Outbound delivery never awaits.
//!
//! # Modules
//!
//! - [`actors`] - The session coordinator actor and its handle
//! - [`rooms`] - Room store and participant model
//! - [`registry`] - Live connection registry and transport groups
//! - [`dispatch`] - Broadcast dispatcher
//! - [`protocol`] - Wire events exchanged over the WebSocket
//! - [`connection`] - Per-WebSocket session task
//! - [`token`] - Media transport access token issuance
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types

pub mod actors;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod routes;
pub mod token;
