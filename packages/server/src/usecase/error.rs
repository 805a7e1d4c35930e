//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ParticipantId, RepositoryError, RoomError, RoomId, ValueObjectError};

use super::registry::Role;

/// Errors reported by [`Router`](super::Router) operations.
///
/// None of these are fatal to a connection: session handlers log them and
/// keep reading frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValueObjectError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Every generated room id collided with an existing room.
    #[error("could not allocate a room id after {attempts} attempts")]
    RoomIdExhausted { attempts: usize },
}

impl From<RepositoryError> for RouterError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RoomNotFound(room_id) => RouterError::RoomNotFound(room_id),
            RepositoryError::Room(err) => RouterError::Room(err),
            // create_room retries collisions itself; anything reaching here is exhausted.
            RepositoryError::DuplicateRoomId(_) => RouterError::RoomIdExhausted { attempts: 1 },
        }
    }
}

/// Errors raised by the connection registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{role} '{id}' is already bound to a live connection")]
    AlreadyBound { role: Role, id: ParticipantId },
}
