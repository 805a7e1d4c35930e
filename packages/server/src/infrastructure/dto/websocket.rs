//! WebSocket frame DTOs for the user, agent and admin channels.
//!
//! Every frame is a JSON object with a `type` discriminator. Inbound frames
//! decode into one closed enum per channel; a frame without `type` is treated
//! as `message`, and an unknown `type` decodes to `Unrecognized`.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::http::{ChatHistoryDto, RoomSummaryDto};
use crate::domain::{HumanRequest, Priority, SenderRole};

/// Frame type assumed when the `type` field is missing.
pub const DEFAULT_FRAME_TYPE: &str = "message";

/// Decode one inbound text frame, applying the default frame type.
pub fn decode_frame<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_str(text)?;
    if let Some(object) = value.as_object_mut() {
        object
            .entry("type")
            .or_insert_with(|| serde_json::Value::String(DEFAULT_FRAME_TYPE.to_string()));
    }
    serde_json::from_value(value)
}

fn anonymous() -> String {
    "Anonymous".to_string()
}

fn default_agent_name() -> String {
    "Agent".to_string()
}

fn no_issue() -> String {
    "No issue specified".to_string()
}

fn user_sender() -> SenderRole {
    SenderRole::User
}

fn human_sender() -> SenderRole {
    SenderRole::Human
}

/// Inbound frames on the user channel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserFrame {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        #[serde(default = "anonymous")]
        user_name: String,
        #[serde(default)]
        user_email: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Message {
        room_id: String,
        #[serde(default)]
        message: String,
        #[serde(default = "user_sender")]
        sender: SenderRole,
    },
    #[serde(rename_all = "camelCase")]
    Typing {
        room_id: String,
        #[serde(default)]
        is_typing: bool,
    },
    #[serde(rename_all = "camelCase")]
    RequestHuman {
        room_id: String,
        #[serde(default = "anonymous")]
        user_name: String,
        #[serde(default)]
        user_email: Option<String>,
        #[serde(default = "no_issue")]
        issue: String,
    },
    #[serde(other)]
    Unrecognized,
}

/// Inbound frames on the agent channel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentFrame {
    /// The token is accepted but not verified.
    #[serde(rename_all = "camelCase")]
    AgentAuth {
        #[serde(default)]
        token: Option<String>,
        #[serde(default = "default_agent_name")]
        agent_name: String,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoomAgent {
        room_id: String,
        #[serde(default = "default_agent_name")]
        agent_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Message {
        room_id: String,
        #[serde(default)]
        message: String,
        #[serde(default = "human_sender")]
        sender: SenderRole,
        #[serde(default = "default_agent_name")]
        agent_name: String,
    },
    #[serde(rename_all = "camelCase")]
    GetChatHistory { room_id: String },
    #[serde(rename_all = "camelCase")]
    Typing {
        room_id: String,
        #[serde(default)]
        is_typing: bool,
    },
    #[serde(rename_all = "camelCase")]
    EndChat {
        room_id: String,
        #[serde(default = "default_agent_name")]
        agent_name: String,
    },
    #[serde(other)]
    Unrecognized,
}

/// Inbound frames on the admin channel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminFrame {
    /// The token is accepted but not verified.
    AdminAuth {
        #[serde(default)]
        token: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GetTranscript { room_id: String },
    #[serde(rename_all = "camelCase")]
    DeleteChat { room_id: String },
    #[serde(other)]
    Unrecognized,
}

/// Escalation ticket as shown to agents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanRequestDto {
    pub room_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub issue: String,
    pub timestamp: String, // RFC 3339
    pub priority: Priority,
}

impl From<&HumanRequest> for HumanRequestDto {
    fn from(request: &HumanRequest) -> Self {
        Self {
            room_id: request.room_id.as_str().to_string(),
            user_id: request.user_id.as_str().to_string(),
            user_name: request.user_name.clone(),
            user_email: request.user_email.clone(),
            issue: request.issue.clone(),
            timestamp: request.timestamp.to_rfc3339(),
            priority: request.priority,
        }
    }
}

/// Outbound frames, for every channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    // user channel
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String },
    /// Chat message. Users receive bot and agent messages, agents receive
    /// user messages.
    #[serde(rename_all = "camelCase")]
    Message {
        message: String,
        sender: SenderRole,
        timestamp: String,
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    HumanJoined { agent_name: String, room_id: String },
    #[serde(rename_all = "camelCase")]
    HumanRequested { room_id: String },
    #[serde(rename_all = "camelCase")]
    Typing {
        is_typing: bool,
        sender: SenderRole,
        room_id: String,
    },
    #[serde(rename_all = "camelCase")]
    ChatEnded { agent_name: String, room_id: String },

    // agent channel
    PendingRequests { requests: Vec<HumanRequestDto> },
    NewRequest { data: HumanRequestDto },
    #[serde(rename_all = "camelCase")]
    RequestTaken { room_id: String, agent_name: String },
    /// The room could not be claimed (taken, not escalated, or closed).
    #[serde(rename_all = "camelCase")]
    JoinRejected { room_id: String, reason: String },
    ChatHistory { data: ChatHistoryDto },

    // admin channel
    ChatList { chats: Vec<RoomSummaryDto> },
    ChatTranscript { data: ChatHistoryDto },
    #[serde(rename_all = "camelCase")]
    ChatDeleted { room_id: String },
    NewChatRoom { data: RoomSummaryDto },
}

impl ServerFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
