//! Admin channel (`/admin`).
//!
//! Admin connections are bound on connect so they receive `new_chat_room`
//! before authenticating.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::IntoResponse,
};
use tokio::sync::mpsc;

use super::session::{self, SessionHandler, log_router_error, parse_room_id, reply};
use crate::{
    domain::{ParticipantId, ParticipantIdFactory},
    infrastructure::dto::{
        http::{ChatHistoryDto, RoomSummaryDto},
        websocket::{AdminFrame, ServerFrame, decode_frame},
    },
    ui::state::AppState,
    usecase::{Outbox, Role},
};

pub async fn admin_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let admin_id = match ParticipantIdFactory::generate() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "failed to allocate an admin id");
            return;
        }
    };
    let (outbox, rx) = mpsc::unbounded_channel();
    if let Err(e) = state
        .router
        .bind_admin(admin_id.clone(), outbox.clone())
        .await
    {
        log_router_error(Role::Admin, "connect", &e);
        return;
    }

    let handler = AdminSession {
        state,
        admin_id,
        outbox,
    };
    session::pump(socket, rx, handler).await;
}

struct AdminSession {
    state: Arc<AppState>,
    admin_id: ParticipantId,
    outbox: Outbox,
}

#[async_trait]
impl SessionHandler for AdminSession {
    async fn on_frame(&mut self, text: &str) {
        let frame: AdminFrame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(admin_id = %self.admin_id, error = %e, "malformed admin frame dropped");
                return;
            }
        };
        let router = &self.state.router;

        match frame {
            AdminFrame::AdminAuth { .. } => {
                let chats = router
                    .list_rooms()
                    .await
                    .iter()
                    .map(RoomSummaryDto::from)
                    .collect();
                reply(&self.outbox, &ServerFrame::ChatList { chats });
            }
            AdminFrame::GetTranscript { room_id } => {
                let Some(room_id) = parse_room_id(Role::Admin, room_id) else {
                    return;
                };
                match router.room_snapshot(&room_id).await {
                    Ok(room) => reply(
                        &self.outbox,
                        &ServerFrame::ChatTranscript {
                            data: ChatHistoryDto::from(&room),
                        },
                    ),
                    Err(e) => log_router_error(Role::Admin, "get_transcript", &e),
                }
            }
            AdminFrame::DeleteChat { room_id } => {
                let Some(room_id) = parse_room_id(Role::Admin, room_id) else {
                    return;
                };
                let ack = router.delete_room(&room_id).await;
                reply(&self.outbox, &ack);
            }
            AdminFrame::Unrecognized => {
                tracing::debug!(admin_id = %self.admin_id, "unrecognized admin frame dropped");
            }
        }
    }

    async fn on_close(&mut self) {
        self.state
            .router
            .disconnect(Role::Admin, &self.admin_id)
            .await;
        tracing::info!(admin_id = %self.admin_id, "admin disconnected");
    }
}
