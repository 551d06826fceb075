//! # Room Test Utilities
//!
//! Shared helpers for Room Service integration tests:
//! - `TestRoomServer`: the real router served on `127.0.0.1:0`
//! - `TestClient`: a WebSocket client speaking the room event protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use room_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestRoomServer::spawn().await?;
//!     let mut alice = server.connect().await?;
//!
//!     alice.join("r1", "Alice").await?;
//!     let participants = alice.expect_event("participants").await?;
//!     assert_eq!(participants[0]["name"], "Alice");
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod ws_client;

pub use server_harness::*;
pub use ws_client::*;
