//! Per-WebSocket session task.
//!
//! Each upgraded socket gets a fresh [`ConnectionId`] and is split in two:
//!
//! - a writer task drains the connection's bounded outbound queue into the
//!   socket and sends keepalive pings;
//! - the reader loop parses inbound text frames and forwards them to the
//!   coordinator in arrival order.
//!
//! Whichever side ends first ends the session. The coordinator is always
//! told about the disconnect, however the socket went away.

use crate::actors::SessionCoordinatorHandle;
use crate::config::Config;
use crate::errors::RoomError;
use crate::protocol::{ClientEvent, ServerEvent};
use axum::extract::ws::{Message, WebSocket};
use common::types::ConnectionId;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Per-connection transport settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Outbound queue capacity; events beyond it are dropped.
    pub send_buffer: usize,
    pub ping_interval: Duration,
}

impl SessionSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            send_buffer: config.connection_send_buffer,
            ping_interval: Duration::from_secs(config.ws_ping_interval_seconds),
        }
    }
}

/// Drive one WebSocket connection until it closes or `cancel_token` fires.
#[instrument(skip_all, name = "room.ws.session")]
pub async fn run_session(
    socket: WebSocket,
    coordinator: SessionCoordinatorHandle,
    settings: SessionSettings,
    cancel_token: CancellationToken,
) {
    let connection_id = ConnectionId::new();
    let (outbound_tx, outbound_rx) = mpsc::channel(settings.send_buffer);

    if let Err(e) = coordinator.connect(connection_id.clone(), outbound_tx).await {
        warn!(
            target: "room.ws",
            connection_id = %connection_id,
            error = %e,
            "Coordinator unavailable, closing connection"
        );
        return;
    }

    info!(target: "room.ws", connection_id = %connection_id, "WebSocket connected");

    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_loop(
        ws_tx,
        outbound_rx,
        connection_id.clone(),
        settings.ping_interval,
        cancel_token,
    ));

    tokio::select! {
        result = read_loop(ws_rx, &connection_id, &coordinator) => {
            if let Err(e) = result {
                debug!(
                    target: "room.ws",
                    connection_id = %connection_id,
                    error = %e,
                    "Reader stopped"
                );
            }
            writer.abort();
        }
        _ = &mut writer => {
            debug!(target: "room.ws", connection_id = %connection_id, "Writer stopped");
        }
    }

    if let Err(e) = coordinator.disconnect(connection_id.clone()).await {
        debug!(
            target: "room.ws",
            connection_id = %connection_id,
            error = %e,
            "Disconnect not delivered"
        );
    }

    info!(target: "room.ws", connection_id = %connection_id, "WebSocket disconnected");
}

async fn read_loop(
    mut ws_rx: SplitStream<WebSocket>,
    connection_id: &ConnectionId,
    coordinator: &SessionCoordinatorHandle,
) -> Result<(), RoomError> {
    while let Some(frame) = ws_rx.next().await {
        let frame = frame.map_err(|e| RoomError::Transport(e.to_string()))?;

        match frame {
            Message::Text(text) => match ClientEvent::from_json(&text) {
                Ok(event) => {
                    trace!(
                        target: "room.ws",
                        connection_id = %connection_id,
                        event = event.name(),
                        room_id = %event.room_id(),
                        "Inbound event"
                    );
                    coordinator.dispatch(connection_id.clone(), event).await?;
                }
                Err(e) => {
                    warn!(
                        target: "room.ws",
                        connection_id = %connection_id,
                        error = %e,
                        "Ignoring malformed frame"
                    );
                }
            },
            Message::Binary(_) => {
                debug!(
                    target: "room.ws",
                    connection_id = %connection_id,
                    "Ignoring binary frame"
                );
            }
            Message::Close(_) => break,
            // Pongs are answered by axum
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    Ok(())
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<ServerEvent>,
    connection_id: ConnectionId,
    ping_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ping = tokio::time::interval(ping_interval);
    ping.tick().await;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            event = outbound_rx.recv() => {
                let Some(event) = event else {
                    // Coordinator dropped our queue
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };

                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(
                            target: "room.ws",
                            connection_id = %connection_id,
                            event = event.name(),
                            error = %e,
                            "Failed to serialize outbound event"
                        );
                        continue;
                    }
                };

                if ws_tx.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
                trace!(target: "room.ws", connection_id = %connection_id, "Sent ping");
            }
        }
    }
}
