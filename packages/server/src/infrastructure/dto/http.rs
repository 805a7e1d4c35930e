//! Room payload DTOs, shared by the HTTP API and the admin/agent frames.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, Room, RoomStatus, SenderRole};

/// Room summary for list endpoints and `chat_list` / `new_chat_room` frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub start_time: String, // RFC 3339
    pub last_activity: String, // RFC 3339
    pub status: RoomStatus,
    pub agent_name: Option<String>,
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id.as_str().to_string(),
            user_id: room.user_id.as_str().to_string(),
            user_name: room.user_name.clone(),
            user_email: room.user_email.clone(),
            start_time: room.start_time.to_rfc3339(),
            last_activity: room.last_activity.to_rfc3339(),
            status: room.status,
            agent_name: room.agent_name().map(str::to_string),
        }
    }
}

/// One message of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub message: String,
    pub sender: SenderRole,
    pub timestamp: String, // RFC 3339
    pub agent_name: Option<String>,
}

impl From<&ChatMessage> for MessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            message: message.content.as_str().to_string(),
            sender: message.sender,
            timestamp: message.timestamp.to_rfc3339(),
            agent_name: message.agent_name.clone(),
        }
    }
}

/// Full history of a room for `chat_history`, `chat_transcript` and the
/// room detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryDto {
    pub room_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub start_time: String, // RFC 3339
    pub messages: Vec<MessageDto>,
}

impl From<&Room> for ChatHistoryDto {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id.as_str().to_string(),
            user_name: room.user_name.clone(),
            user_email: room.user_email.clone(),
            start_time: room.start_time.to_rfc3339(),
            messages: room.messages.iter().map(MessageDto::from).collect(),
        }
    }
}
