//! WebSocket test client for the room event protocol.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long `recv` waits for the next event.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// A connected room client.
pub struct TestClient {
    id: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to `url` and read the `connected` event.
    pub async fn connect(url: &str) -> Result<Self, anyhow::Error> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| anyhow::anyhow!("WebSocket connect to {} failed: {}", url, e))?;

        let mut client = Self {
            id: String::new(),
            stream,
        };

        let data = client.expect_event("connected").await?;
        client.id = data["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("connected event without id: {data}"))?
            .to_string();

        Ok(client)
    }

    /// Connection ID assigned by the server.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), anyhow::Error> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| anyhow::anyhow!("WebSocket send failed: {}", e))
    }

    /// Send `{"event": event, "data": data}`.
    pub async fn send_event(&mut self, event: &str, data: Value) -> Result<(), anyhow::Error> {
        self.send_text(json!({ "event": event, "data": data }).to_string())
            .await
    }

    pub async fn join(&mut self, room_id: &str, user_name: &str) -> Result<(), anyhow::Error> {
        self.send_event("join-room", json!({ "roomId": room_id, "userName": user_name }))
            .await
    }

    pub async fn chat(
        &mut self,
        room_id: &str,
        message: &str,
        user_name: &str,
    ) -> Result<(), anyhow::Error> {
        self.send_event(
            "chat-message",
            json!({ "roomId": room_id, "message": message, "userName": user_name }),
        )
        .await
    }

    pub async fn kick(&mut self, room_id: &str, user_id: &str) -> Result<(), anyhow::Error> {
        self.send_event("kick-user", json!({ "roomId": room_id, "userId": user_id }))
            .await
    }

    pub async fn end_meeting(&mut self, room_id: &str) -> Result<(), anyhow::Error> {
        self.send_event("end-meeting", json!({ "roomId": room_id }))
            .await
    }

    /// Next event as `(name, data)`. `data` is `Null` for events without a
    /// payload. Control frames are skipped.
    pub async fn recv(&mut self) -> Result<(String, Value), anyhow::Error> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| anyhow::anyhow!("Timed out waiting for an event"))?
                .ok_or_else(|| anyhow::anyhow!("WebSocket closed"))?
                .map_err(|e| anyhow::anyhow!("WebSocket receive failed: {}", e))?;

            match frame {
                Message::Text(text) => {
                    let mut value: Value = serde_json::from_str(&text)?;
                    let name = value["event"]
                        .as_str()
                        .ok_or_else(|| anyhow::anyhow!("frame without event name: {text}"))?
                        .to_string();
                    return Ok((name, value["data"].take()));
                }
                Message::Close(_) => anyhow::bail!("WebSocket closed by server"),
                _ => continue,
            }
        }
    }

    /// Receive the next event and require it to be `name`. Returns its data.
    pub async fn expect_event(&mut self, name: &str) -> Result<Value, anyhow::Error> {
        let (received, data) = self.recv().await?;
        if received != name {
            anyhow::bail!("Expected event {name}, got {received} with {data}");
        }
        Ok(data)
    }

    /// Require that no event arrives within `wait`.
    pub async fn expect_no_event(&mut self, wait: Duration) -> Result<(), anyhow::Error> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.stream.next()).await {
                Err(_) => return Ok(()),
                Ok(Some(Ok(Message::Text(text)))) => anyhow::bail!("Unexpected event: {text}"),
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => anyhow::bail!("WebSocket receive failed: {e}"),
                Ok(None) => anyhow::bail!("WebSocket closed"),
            }
        }
    }

    /// Close the connection with a close frame.
    pub async fn close(mut self) -> Result<(), anyhow::Error> {
        self.stream
            .close(None)
            .await
            .map_err(|e| anyhow::anyhow!("WebSocket close failed: {}", e))
    }
}
