//! Test fixtures: an in-process server and a WebSocket test client.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use handoff_server::{
    domain::SensitivityClassifier,
    infrastructure::{
        EchoResponder, InMemoryChatStore, InMemoryRoomRepository, LogNotifier,
        dto::websocket::ServerFrame,
    },
    usecase::{Collaborators, Router, RouterSettings},
};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// Reply delay used by integration tests.
pub const TEST_REPLY_DELAY: Duration = Duration::from_millis(50);

/// How long a client waits for an expected frame.
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// Server running on an ephemeral port inside the test runtime.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(RouterSettings {
            reply_delay: TEST_REPLY_DELAY,
            ..RouterSettings::default()
        })
        .await
    }

    pub async fn start_with(settings: RouterSettings) -> Self {
        let router = Arc::new(Router::new(
            Collaborators {
                rooms: Arc::new(InMemoryRoomRepository::new()),
                store: Arc::new(InMemoryChatStore::new()),
                notifier: Arc::new(LogNotifier::new()),
                responder: Arc::new(EchoResponder::new()),
            },
            SensitivityClassifier::default(),
            settings,
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = handoff_server::ui::serve(listener, router, shutdown).await {
                eprintln!("test server error: {e}");
            }
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// WebSocket client speaking JSON frames.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url)
            .await
            .expect("Failed to connect WebSocket");
        Self { stream }
    }

    pub async fn send_json(&mut self, value: serde_json::Value) {
        self.send_raw(&value.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next server frame, failing the test after a timeout.
    pub async fn next_frame(&mut self) -> ServerFrame {
        loop {
            let msg = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("Failed to decode frame");
            }
        }
    }

    /// Skip frames until one satisfies `pred`.
    pub async fn next_frame_matching<F>(&mut self, pred: F) -> ServerFrame
    where
        F: Fn(&ServerFrame) -> bool,
    {
        loop {
            let frame = self.next_frame().await;
            if pred(&frame) {
                return frame;
            }
        }
    }

    /// Assert that no text frame arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(wait, self.stream.next()).await
        {
            panic!("Unexpected frame: {text}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// Open a user connection and create a room. Returns the client and room id.
pub async fn join_as_user(server: &TestServer, user_name: &str) -> (WsClient, String) {
    let mut user = WsClient::connect(&server.ws_url("/ws")).await;
    user.send_json(serde_json::json!({
        "type": "join_room",
        "userName": user_name,
        "userEmail": format!("{}@example.com", user_name.to_lowercase()),
    }))
    .await;
    match user.next_frame().await {
        ServerFrame::RoomCreated { room_id } => (user, room_id),
        other => panic!("Expected room_created, got {other:?}"),
    }
}

/// Open an agent connection and authenticate. Returns the client and the
/// pending queue it was sent.
pub async fn auth_as_agent(server: &TestServer, agent_name: &str) -> (WsClient, ServerFrame) {
    let mut agent = WsClient::connect(&server.ws_url("/agent")).await;
    agent
        .send_json(serde_json::json!({
            "type": "agent_auth",
            "token": "test-token",
            "agentName": agent_name,
        }))
        .await;
    let queue = agent.next_frame().await;
    (agent, queue)
}
