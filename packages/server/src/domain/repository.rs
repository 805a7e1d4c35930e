//! Room Store port.
//!
//! The in-memory room repository is the single source of truth for routing
//! decisions. Every mutating method runs inside one exclusive section per
//! room, so transitions on the same room never interleave. Each committed
//! change is reported to the given [`ChangeSink`] before that section ends.

use async_trait::async_trait;
use thiserror::Error;

use super::{
    collaborator::ChangeSink,
    entity::{
        AgentAssignment, ChatMessage, Escalation, HumanRequest, Room, RoomRouting, TicketDetails,
    },
    error::RoomError,
    value_object::{RoomId, Timestamp},
};

/// Errors returned by the room repository
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("room id already in use: {0}")]
    DuplicateRoomId(RoomId),

    #[error(transparent)]
    Room(#[from] RoomError),
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Insert a new room; fails if the id is taken.
    async fn insert_room(&self, room: Room, sink: &dyn ChangeSink) -> Result<(), RepositoryError>;

    /// Snapshot of one room, including its history.
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    async fn get_routing(&self, room_id: &RoomId) -> Result<RoomRouting, RepositoryError>;

    /// Snapshots of every room, oldest first.
    async fn list_rooms(&self) -> Vec<Room>;

    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
        sink: &dyn ChangeSink,
    ) -> Result<RoomRouting, RepositoryError>;

    async fn escalate(
        &self,
        room_id: &RoomId,
        details: TicketDetails,
        at: Timestamp,
        sink: &dyn ChangeSink,
    ) -> Result<(RoomRouting, Escalation), RepositoryError>;

    /// Claim a pending room. Returns the withdrawn ticket, if any.
    async fn assign_agent(
        &self,
        room_id: &RoomId,
        assignment: AgentAssignment,
        sink: &dyn ChangeSink,
    ) -> Result<(RoomRouting, Option<HumanRequest>), RepositoryError>;

    /// Close a room. Returns the appended "Chat ended by" notice.
    async fn close_room(
        &self,
        room_id: &RoomId,
        ended_by: &str,
        at: Timestamp,
        sink: &dyn ChangeSink,
    ) -> Result<(RoomRouting, ChatMessage), RepositoryError>;

    async fn remove_room(&self, room_id: &RoomId, sink: &dyn ChangeSink) -> Option<Room>;

    /// Live tickets, oldest first.
    async fn pending_requests(&self) -> Vec<HumanRequest>;
}
