//! Test server harness.
//!
//! Provides `TestRoomServer` for spawning a real Room Service instance.

use crate::ws_client::TestClient;
use common::types::RoomId;
use metrics_exporter_prometheus::PrometheusBuilder;
use room_service::actors::{CoordinatorStatus, SessionCoordinatorHandle};
use room_service::config::Config;
use room_service::observability::HealthState;
use room_service::rooms::RoomSnapshot;
use room_service::routes::{self, AppState};
use room_service::token::{RtcTokenBuilder, TokenIssuer};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Application ID used by test servers.
pub const TEST_APP_ID: &str = "970CA35de60c44645bbae8a215061b33";

/// Application certificate used by test servers.
pub const TEST_APP_CERTIFICATE: &str = "5CFd2fd1755d40ecb72977518be15d3b";

/// A running Room Service bound to a random local port.
///
/// The server task is aborted and the coordinator cancelled on drop.
pub struct TestRoomServer {
    addr: SocketAddr,
    config: Config,
    coordinator: SessionCoordinatorHandle,
    health: Arc<HealthState>,
    _handle: JoinHandle<()>,
}

impl TestRoomServer {
    /// Spawn a server with test media credentials configured.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::from([
            ("APP_ID".to_string(), TEST_APP_ID.to_string()),
            (
                "APP_CERTIFICATE".to_string(),
                TEST_APP_CERTIFICATE.to_string(),
            ),
        ]))
        .await
    }

    /// Spawn a server without media credentials.
    pub async fn spawn_without_credentials() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a server from explicit environment variables. `BIND_ADDRESS`
    /// is always forced to `127.0.0.1:0`.
    pub async fn spawn_with_vars(mut vars: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string());

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let token_issuer = RtcTokenBuilder::from_config(&config)
            .map(|builder| Arc::new(builder) as Arc<dyn TokenIssuer>);

        let coordinator = SessionCoordinatorHandle::spawn();
        let health = Arc::new(HealthState::new());

        let state = Arc::new(AppState {
            config: config.clone(),
            coordinator: coordinator.clone(),
            token_issuer,
            health: Arc::clone(&health),
        });

        // Recorder is not installed globally; tests run many servers per process.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        health.set_ready();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            coordinator,
            health,
            _handle: handle,
        })
    }

    /// Base HTTP URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket endpoint URL.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    /// Open a WebSocket session and wait for its `connected` event.
    pub async fn connect(&self) -> Result<TestClient, anyhow::Error> {
        TestClient::connect(&self.ws_url()).await
    }

    /// Snapshot of a room straight from the coordinator.
    pub async fn room(&self, room_id: &str) -> Result<Option<RoomSnapshot>, anyhow::Error> {
        self.coordinator
            .get_room(RoomId::from(room_id))
            .await
            .map_err(|e| anyhow::anyhow!("get_room failed: {}", e))
    }

    pub async fn status(&self) -> Result<CoordinatorStatus, anyhow::Error> {
        self.coordinator
            .get_status()
            .await
            .map_err(|e| anyhow::anyhow!("get_status failed: {}", e))
    }

    /// Poll the coordinator until `predicate` holds or two seconds pass.
    ///
    /// Disconnects travel from the socket to the coordinator asynchronously,
    /// so tests wait on the resulting state instead of sleeping.
    pub async fn wait_for_status(
        &self,
        predicate: impl Fn(&CoordinatorStatus) -> bool,
    ) -> Result<CoordinatorStatus, anyhow::Error> {
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
        loop {
            let status = self.status().await?;
            if predicate(&status) {
                return Ok(status);
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("Timed out waiting for coordinator status, last: {status:?}");
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestRoomServer {
    fn drop(&mut self) {
        self._handle.abort();
        self.coordinator.cancel();
    }
}
