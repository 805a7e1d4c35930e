//! Agent channel (`/agent`).

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
        http::ChatHistoryDto,
        websocket::{AgentFrame, ServerFrame, decode_frame},
    },
    ui::state::AppState,
    usecase::{Outbox, Role},
};

pub async fn agent_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let agent_id = match ParticipantIdFactory::generate() {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "failed to allocate an agent id");
            return;
        }
    };
    let (outbox, rx) = mpsc::unbounded_channel();
    tracing::info!(%agent_id, "agent connected");

    let handler = AgentSession {
        state,
        agent_id,
        outbox,
    };
    session::pump(socket, rx, handler).await;
}

struct AgentSession {
    state: Arc<AppState>,
    agent_id: ParticipantId,
    outbox: Outbox,
}

#[async_trait]
impl SessionHandler for AgentSession {
    async fn on_frame(&mut self, text: &str) {
        let frame: AgentFrame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(agent_id = %self.agent_id, error = %e, "malformed agent frame dropped");
                return;
            }
        };
        let router = &self.state.router;

        match frame {
            AgentFrame::AgentAuth { agent_name, .. } => {
                tracing::debug!(agent_id = %self.agent_id, agent_name, "agent_auth");
                match router
                    .bind_agent(self.agent_id.clone(), self.outbox.clone())
                    .await
                {
                    Ok(frame) => reply(&self.outbox, &frame),
                    Err(e) => log_router_error(Role::Agent, "agent_auth", &e),
                }
            }
            AgentFrame::JoinRoomAgent {
                room_id,
                agent_name,
            } => {
                let Some(room_id) = parse_room_id(Role::Agent, room_id) else {
                    return;
                };
                match router
                    .agent_join(&room_id, self.agent_id.clone(), agent_name)
                    .await
                {
                    Ok(Some(rejected)) => reply(&self.outbox, &rejected),
                    Ok(None) => {}
                    Err(e) => log_router_error(Role::Agent, "join_room_agent", &e),
                }
            }
            AgentFrame::Message {
                room_id,
                message,
                sender,
                agent_name,
            } => {
                let Some(room_id) = parse_room_id(Role::Agent, room_id) else {
                    return;
                };
                match router
                    .dispatch_message(&room_id, message, sender, Some(agent_name))
                    .await
                {
                    Ok(frames) => frames.iter().for_each(|f| reply(&self.outbox, f)),
                    Err(e) => log_router_error(Role::Agent, "message", &e),
                }
            }
            AgentFrame::GetChatHistory { room_id } => {
                let Some(room_id) = parse_room_id(Role::Agent, room_id) else {
                    return;
                };
                match router.room_snapshot(&room_id).await {
                    Ok(room) => reply(
                        &self.outbox,
                        &ServerFrame::ChatHistory {
                            data: ChatHistoryDto::from(&room),
                        },
                    ),
                    Err(e) => log_router_error(Role::Agent, "get_chat_history", &e),
                }
            }
            AgentFrame::Typing { room_id, is_typing } => {
                let Some(room_id) = parse_room_id(Role::Agent, room_id) else {
                    return;
                };
                if let Err(e) = router.forward_typing(&room_id, Role::Agent, is_typing).await {
                    log_router_error(Role::Agent, "typing", &e);
                }
            }
            AgentFrame::EndChat {
                room_id,
                agent_name,
            } => {
                let Some(room_id) = parse_room_id(Role::Agent, room_id) else {
                    return;
                };
                if let Err(e) = router.end_chat(&room_id, agent_name).await {
                    log_router_error(Role::Agent, "end_chat", &e);
                }
            }
            AgentFrame::Unrecognized => {
                tracing::debug!(agent_id = %self.agent_id, "unrecognized agent frame dropped");
            }
        }
    }

    async fn on_close(&mut self) {
        self.state
            .router
            .disconnect(Role::Agent, &self.agent_id)
            .await;
        tracing::info!(agent_id = %self.agent_id, "agent disconnected");
    }
}
