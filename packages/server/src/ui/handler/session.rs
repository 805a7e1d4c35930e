//! Per-connection socket pump shared by the user, agent and admin channels.
//!
//! Outbound frames are queued on the connection's outbox and written by a
//! dedicated task. Inbound text frames are handled one at a time, in order,
//! until the client closes or the transport fails; then the handler's
//! cleanup runs unconditionally.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::RoomId,
    infrastructure::dto::websocket::ServerFrame,
    usecase::{Outbox, Role, RouterError},
};

/// Role-specific behavior plugged into [`pump`].
#[async_trait]
pub(super) trait SessionHandler: Send {
    /// Handle one inbound text frame. Failures are logged, never fatal.
    async fn on_frame(&mut self, text: &str);

    /// Release the connection's bindings.
    async fn on_close(&mut self);
}

pub(super) async fn pump<H: SessionHandler>(
    socket: WebSocket,
    mut rx: mpsc::UnboundedReceiver<String>,
    mut handler: H,
) {
    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => handler.on_frame(text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => tracing::debug!("binary frame ignored"),
            // Ping/pong is handled by the WebSocket protocol layer
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "websocket transport error");
                break;
            }
        }
    }

    send_task.abort();
    handler.on_close().await;
}

/// Queue a frame for the calling connection.
pub(super) fn reply(outbox: &Outbox, frame: &ServerFrame) {
    match frame.encode() {
        Ok(payload) => {
            if outbox.send(payload).is_err() {
                tracing::debug!("reply skipped: connection closed");
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to encode reply frame"),
    }
}

/// Parse a room id from a frame, logging and dropping the frame if invalid.
pub(super) fn parse_room_id(role: Role, raw: String) -> Option<RoomId> {
    match RoomId::try_from(raw) {
        Ok(room_id) => Some(room_id),
        Err(e) => {
            tracing::warn!(%role, error = %e, "frame with invalid roomId dropped");
            None
        }
    }
}

/// Log a failed router operation at a level matching its cause.
pub(super) fn log_router_error(role: Role, operation: &str, err: &RouterError) {
    match err {
        RouterError::RoomNotFound(room_id) => {
            tracing::debug!(%role, operation, %room_id, "frame for unknown room dropped")
        }
        RouterError::Room(reason) => {
            tracing::info!(%role, operation, %reason, "room refused the operation")
        }
        other => tracing::warn!(%role, operation, error = %other, "operation failed"),
    }
}
