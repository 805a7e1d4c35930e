//! User channel (`/ws`).

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::IntoResponse,
};
use tokio::sync::mpsc;

use super::session::{self, SessionHandler, log_router_error, parse_room_id, reply};
use crate::{
    domain::{ParticipantId, ParticipantIdFactory, TicketDetails},
    infrastructure::dto::websocket::{UserFrame, decode_frame},
    ui::state::AppState,
    usecase::{Outbox, Role},
};

pub async fn user_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let user_id = match ParticipantIdFactory::generate() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "failed to allocate a user id");
            return;
        }
    };
    let (outbox, rx) = mpsc::unbounded_channel();
    tracing::info!(%user_id, "user connected");

    let handler = UserSession {
        state,
        user_id,
        outbox,
    };
    session::pump(socket, rx, handler).await;
}

struct UserSession {
    state: Arc<AppState>,
    user_id: ParticipantId,
    outbox: Outbox,
}

#[async_trait]
impl SessionHandler for UserSession {
    async fn on_frame(&mut self, text: &str) {
        let frame: UserFrame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "malformed user frame dropped");
                return;
            }
        };
        let router = &self.state.router;

        match frame {
            UserFrame::JoinRoom {
                user_name,
                user_email,
            } => {
                match router
                    .create_room(
                        self.user_id.clone(),
                        self.outbox.clone(),
                        user_name,
                        user_email,
                    )
                    .await
                {
                    Ok(frame) => reply(&self.outbox, &frame),
                    Err(e) => log_router_error(Role::User, "join_room", &e),
                }
            }
            UserFrame::Message {
                room_id,
                message,
                sender,
            } => {
                let Some(room_id) = parse_room_id(Role::User, room_id) else {
                    return;
                };
                match router
                    .dispatch_message(&room_id, message, sender, None)
                    .await
                {
                    Ok(frames) => frames.iter().for_each(|f| reply(&self.outbox, f)),
                    Err(e) => log_router_error(Role::User, "message", &e),
                }
            }
            UserFrame::Typing { room_id, is_typing } => {
                let Some(room_id) = parse_room_id(Role::User, room_id) else {
                    return;
                };
                if let Err(e) = router.forward_typing(&room_id, Role::User, is_typing).await {
                    log_router_error(Role::User, "typing", &e);
                }
            }
            UserFrame::RequestHuman {
                room_id,
                user_name,
                user_email,
                issue,
            } => {
                let Some(room_id) = parse_room_id(Role::User, room_id) else {
                    return;
                };
                let details = TicketDetails {
                    user_name,
                    user_email,
                    issue,
                };
                match router.request_human(&room_id, details).await {
                    Ok(frame) => reply(&self.outbox, &frame),
                    Err(e) => log_router_error(Role::User, "request_human", &e),
                }
            }
            UserFrame::Unrecognized => {
                tracing::debug!(user_id = %self.user_id, "unrecognized user frame dropped");
            }
        }
    }

    async fn on_close(&mut self) {
        self.state.router.disconnect(Role::User, &self.user_id).await;
        tracing::info!(user_id = %self.user_id, "user disconnected");
    }
}
