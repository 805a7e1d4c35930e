//! Domain layer for the support chat router.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod classifier;
pub mod collaborator;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use classifier::{SensitiveCategory, SensitivityClassifier};
pub use collaborator::{
    ChangeSink, ChatStore, Notifier, NotifyError, Responder, ResponderError, RoomChange,
    StoreError,
};
#[cfg(test)]
pub use collaborator::{MockChatStore, MockNotifier, MockResponder};
pub use entity::{
    AgentAssignment, ChatMessage, Escalation, HUMAN_REQUESTED_NOTICE, HumanRequest, Priority,
    Room, RoomRouting, RoomStatus, SenderRole, TicketDetails,
};
pub use error::{RoomError, ValueObjectError};
pub use factory::{ParticipantIdFactory, RoomIdFactory};
pub use repository::{RepositoryError, RoomRepository};
pub use value_object::{MessageContent, ParticipantId, RoomId, Timestamp};
