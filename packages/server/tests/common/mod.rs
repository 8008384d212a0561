//! Helpers for end-to-end tests: an in-process server on an ephemeral port
//! and a small WebSocket client speaking the event protocol.

#![allow(dead_code)]

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tsudoi_server::{
    config::{PersistenceConfig, ServerConfig},
    ui::Server,
};
use tsudoi_shared::time::SystemClock;

pub const TEST_JWT_SECRET: &str = "integration-secret";
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage an in-process server lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Start a server whose snapshot and uploads live under `root`
    pub async fn start(root: &Path) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            uploads_dir: root.join("uploads"),
            max_upload_bytes: 1024 * 1024,
            persistence: PersistenceConfig {
                data_dir: root.join("data"),
                debounce: Duration::from_millis(50),
                save_interval: Duration::from_secs(300),
            },
        };
        let server = Server::build(&config, Arc::new(SystemClock)).await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = shutdown_rx.await;
        }));

        TestServer {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn ws_url(&self, query: &str) -> String {
        format!("ws://{}/ws?{}", self.addr, query)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop the listener and wait for the final snapshot
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .unwrap()
            .unwrap();
    }
}

/// WebSocket client speaking `{"event", "data"}` frames
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("Failed to connect");
        WsClient { stream }
    }

    /// Connect as a guest and consume the greeting; returns the client and its user-connected data
    pub async fn connect_guest(server: &TestServer, username: &str) -> (Self, Value) {
        let mut client = Self::connect(&server.ws_url(&format!("username={}", username))).await;
        let me = client.expect_event("user-connected").await;
        client.expect_event("rooms-list").await;
        (client, me)
    }

    pub async fn send(&mut self, event: &str, data: Value) {
        self.send_raw(json!({"event": event, "data": data}).to_string())
            .await;
    }

    pub async fn send_with_ack(&mut self, event: &str, data: Value, ack_id: u64) {
        self.send_raw(json!({"event": event, "data": data, "ackId": ack_id}).to_string())
            .await;
    }

    pub async fn send_raw(&mut self, text: String) {
        self.stream
            .send(Message::text(text))
            .await
            .expect("Failed to send frame");
    }

    /// Next text frame as JSON
    pub async fn next_frame(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("stream closed")
                .expect("websocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("frame is not JSON");
            }
        }
    }

    /// Skip frames until `event` arrives and return its data
    pub async fn expect_event(&mut self, event: &str) -> Value {
        loop {
            let frame = self.next_frame().await;
            if frame["event"] == event {
                return frame["data"].clone();
            }
        }
    }

    /// Join a room and return the room-joined snapshot
    pub async fn join(&mut self, room_id: &str) -> Value {
        self.send("join-room", json!(room_id)).await;
        self.expect_event("room-joined").await
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
