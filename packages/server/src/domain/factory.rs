//! Domain factories for creating identifiers.

use super::{ParticipantId, RoomId, error::ValueObjectError};

/// Prefix of every generated room id.
pub const ROOM_ID_PREFIX: &str = "room_";

/// Number of hex characters after the prefix.
const ROOM_ID_SUFFIX_LEN: usize = 6;

/// Factory for generating RoomId instances.
///
/// Generated ids are short (`room_` + 6 hex characters), so collisions are
/// possible; the room repository rejects duplicates and callers retry.
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// Generate a new `room_xxxxxx` RoomId from a random UUID v4.
    pub fn generate() -> Result<RoomId, ValueObjectError> {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        RoomId::new(format!("{ROOM_ID_PREFIX}{}", &hex[..ROOM_ID_SUFFIX_LEN]))
    }
}

/// Factory for generating per-connection ParticipantId instances.
pub struct ParticipantIdFactory;

impl ParticipantIdFactory {
    /// Generate a new ParticipantId with a random UUID v4.
    pub fn generate() -> Result<ParticipantId, ValueObjectError> {
        ParticipantId::new(uuid::Uuid::new_v4().to_string())
    }
}
