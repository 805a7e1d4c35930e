//! Ports for external collaborators: durable store, alert delivery and the
//! automated responder.
//!
//! The router never blocks its own state on these. Store writes and alerts
//! are best-effort; failures are logged by the caller and never roll back an
//! in-memory transition.

use async_trait::async_trait;
use thiserror::Error;

use super::{
    entity::{AgentAssignment, ChatMessage, HumanRequest, Room, RoomStatus},
    value_object::RoomId,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("room not found in store: {0}")]
    RoomNotFound(RoomId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build alert: {0}")]
    Build(String),

    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("responder unavailable: {0}")]
    Unavailable(String),
}

/// Durable mirror of rooms, messages and escalation tickets.
///
/// Every operation is safe to retry: inserts upsert by room id and deletes of
/// missing rows succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn insert_room(&self, room: Room) -> Result<(), StoreError>;

    async fn append_message(&self, room_id: RoomId, message: ChatMessage)
    -> Result<(), StoreError>;

    /// Persist the status together with the current agent (`None` clears it).
    async fn set_room_status(
        &self,
        room_id: RoomId,
        status: RoomStatus,
        agent: Option<AgentAssignment>,
    ) -> Result<(), StoreError>;

    async fn insert_human_request(&self, request: HumanRequest) -> Result<(), StoreError>;

    async fn delete_human_request(&self, room_id: RoomId) -> Result<(), StoreError>;

    async fn list_human_requests(&self) -> Result<Vec<HumanRequest>, StoreError>;

    async fn delete_room(&self, room_id: RoomId) -> Result<(), StoreError>;
}

/// One committed room change, in the form the durable store applies it.
#[derive(Debug, Clone)]
pub enum RoomChange {
    InsertRoom(Room),
    AppendMessage {
        room_id: RoomId,
        message: ChatMessage,
    },
    SetRoomStatus {
        room_id: RoomId,
        status: RoomStatus,
        agent: Option<AgentAssignment>,
    },
    InsertHumanRequest(HumanRequest),
    DeleteHumanRequest(RoomId),
    DeleteRoom(RoomId),
}

impl RoomChange {
    pub fn room_id(&self) -> &RoomId {
        match self {
            RoomChange::InsertRoom(room) => &room.id,
            RoomChange::AppendMessage { room_id, .. }
            | RoomChange::SetRoomStatus { room_id, .. }
            | RoomChange::DeleteHumanRequest(room_id)
            | RoomChange::DeleteRoom(room_id) => room_id,
            RoomChange::InsertHumanRequest(request) => &request.room_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoomChange::InsertRoom(_) => "insert_room",
            RoomChange::AppendMessage { .. } => "append_message",
            RoomChange::SetRoomStatus { .. } => "set_room_status",
            RoomChange::InsertHumanRequest(_) => "insert_human_request",
            RoomChange::DeleteHumanRequest(_) => "delete_human_request",
            RoomChange::DeleteRoom(_) => "delete_room",
        }
    }
}

/// Receiver of committed room changes.
///
/// The room repository calls `record` while it still holds the room's lock,
/// so changes to one room arrive in commit order. Implementations must not
/// block.
pub trait ChangeSink: Send + Sync {
    fn record(&self, change: RoomChange);
}

/// Outbound alert delivery (e-mail or similar).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_alert(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), NotifyError>;
}

/// Automated reply generator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, text: &str) -> Result<String, ResponderError>;
}
