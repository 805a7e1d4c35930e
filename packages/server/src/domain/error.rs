//! Domain layer error definitions.

use thiserror::Error;

use super::entity::RoomStatus;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("ParticipantId cannot be empty")]
    ParticipantIdEmpty,

    #[error("ParticipantId cannot exceed {max} characters (got {actual})")]
    ParticipantIdTooLong { max: usize, actual: usize },

    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    #[error("RoomId cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },
}

/// Errors raised by room state transitions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// The room is closed; no further transitions are possible.
    #[error("room is closed")]
    Closed,

    /// Another agent already claimed the room.
    #[error("room already taken by {agent_name}")]
    AlreadyTaken { agent_name: String },

    /// The room is not waiting for an agent.
    #[error("room is not awaiting an agent (status: {status})")]
    NotAwaitingAgent { status: RoomStatus },
}
