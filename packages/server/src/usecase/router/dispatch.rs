//! メッセージとタイピング表示の配送

use crate::{
    domain::{
        ChatMessage, MessageContent, RoomId, RoomRouting, RoomStatus, SenderRole, TicketDetails,
        Timestamp,
    },
    infrastructure::dto::websocket::ServerFrame,
    usecase::{error::RouterError, registry::Role},
};

use super::{Router, message_frame};

/// Bot reply sent instead of an automated answer when a message is sensitive.
pub const DEFLECTION_REPLY: &str =
    "I can't provide a response. I will connect you with a human agent regarding the query.";

impl Router {
    /// Append a message to a room and route it by sender.
    ///
    /// * `user`: forwarded to the room's agent if one is assigned and
    ///   connected, and always classified. A sensitive message is answered
    ///   by the deflection reply. Otherwise, if no agent received it, the
    ///   automated responder answers after the reply delay.
    /// * `human`: forwarded to the room's user
    /// * `bot` / `system`: appended only
    ///
    /// Returns the frames addressed to the calling connection.
    ///
    /// # Errors
    ///
    /// `RouterError::RoomNotFound` if the room does not exist.
    pub async fn dispatch_message(
        &self,
        room_id: &RoomId,
        text: String,
        sender: SenderRole,
        agent_name: Option<String>,
    ) -> Result<Vec<ServerFrame>, RouterError> {
        let content = MessageContent::new(text);
        let message = ChatMessage::new(content, sender, Timestamp::now(), agent_name);
        let routing = self
            .rooms
            .append_message(room_id, message.clone(), &self.mirror)
            .await?;

        match sender {
            SenderRole::User => self.route_user_message(&routing, &message).await,
            SenderRole::Human => {
                let delivered = self
                    .registry
                    .send_to(
                        Role::User,
                        &routing.user_id,
                        &message_frame(room_id, &message),
                    )
                    .await;
                tracing::debug!(%room_id, delivered, "agent message forwarded");
                Ok(Vec::new())
            }
            SenderRole::Bot | SenderRole::System => Ok(Vec::new()),
        }
    }

    async fn route_user_message(
        &self,
        routing: &RoomRouting,
        message: &ChatMessage,
    ) -> Result<Vec<ServerFrame>, RouterError> {
        let room_id = &routing.room_id;

        let forwarded = match &routing.agent {
            Some(agent) => {
                self.registry
                    .send_to(Role::Agent, &agent.agent_id, &message_frame(room_id, message))
                    .await
            }
            None => false,
        };
        if routing.agent.is_some() && !forwarded {
            tracing::info!(%room_id, "assigned agent not connected; falling back to the bot");
        }

        let text = message.content.as_str();
        if let Some(category) = self.classifier.classify(text) {
            let category = category.to_string();
            tracing::info!(%room_id, category, "sensitive message deflected");
            let mut frames = vec![ServerFrame::Message {
                message: DEFLECTION_REPLY.to_string(),
                sender: SenderRole::Bot,
                timestamp: Timestamp::now().to_rfc3339(),
                room_id: room_id.as_str().to_string(),
                agent_name: None,
            }];
            if self.settings.escalate_on_sensitive
                && routing.status == RoomStatus::Active
                && routing.agent.is_none()
            {
                let room = self.rooms.get_room(room_id).await?;
                let details = TicketDetails {
                    user_name: room.user_name,
                    user_email: room.user_email,
                    issue: category,
                };
                frames.push(self.request_human(room_id, details).await?);
            }
            return Ok(frames);
        }

        // The agent is handling the conversation.
        if forwarded {
            return Ok(Vec::new());
        }

        let reply = match self.responder.reply(text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(%room_id, error = %e, "automated responder failed; no reply sent");
                return Ok(Vec::new());
            }
        };
        let bot_message = ChatMessage::new(
            MessageContent::new(reply),
            SenderRole::Bot,
            Timestamp::now(),
            None,
        );
        self.rooms
            .append_message(room_id, bot_message.clone(), &self.mirror)
            .await?;

        tokio::time::sleep(self.settings.reply_delay).await;
        Ok(vec![message_frame(room_id, &bot_message)])
    }

    /// Relay a typing indicator to the other side of the room.
    ///
    /// A user's indicator goes to the assigned agent, if any; an agent's goes
    /// to the room's user. Indicators are never stored.
    pub async fn forward_typing(
        &self,
        room_id: &RoomId,
        from: Role,
        is_typing: bool,
    ) -> Result<(), RouterError> {
        let routing = self.rooms.get_routing(room_id).await?;
        let (target_role, target_id, sender) = match (from, routing.agent) {
            (Role::User, Some(agent)) => (Role::Agent, agent.agent_id, SenderRole::User),
            (Role::Agent, _) => (Role::User, routing.user_id, SenderRole::Human),
            (Role::User, None) | (Role::Admin, _) => {
                tracing::debug!(%room_id, %from, "typing indicator dropped: no counterpart");
                return Ok(());
            }
        };
        self.registry
            .send_to(
                target_role,
                &target_id,
                &ServerFrame::Typing {
                    is_typing,
                    sender,
                    room_id: room_id.as_str().to_string(),
                },
            )
            .await;
        Ok(())
    }
}
