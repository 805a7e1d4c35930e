//! Core domain models for the support chat.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    error::RoomError,
    value_object::{MessageContent, ParticipantId, RoomId, Timestamp},
};

/// System notice appended when a user asks for a human agent.
pub const HUMAN_REQUESTED_NOTICE: &str = "Human agent requested";

/// Lifecycle state of a room.
///
/// `Active -> Pending -> Active -> ... -> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Handled by the automated responder, or by an agent once one joined.
    Active,
    /// Waiting for an agent to claim the room.
    Pending,
    Closed,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomStatus::Active => "active",
            RoomStatus::Pending => "pending",
            RoomStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Bot,
    /// A human support agent.
    Human,
    System,
}

/// Escalation ticket priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// The agent currently handling a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAssignment {
    pub agent_id: ParticipantId,
    pub agent_name: String,
}

impl AgentAssignment {
    pub fn new(agent_id: ParticipantId, agent_name: String) -> Self {
        Self {
            agent_id,
            agent_name,
        }
    }
}

/// One utterance within a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: MessageContent,
    pub sender: SenderRole,
    pub timestamp: Timestamp,
    /// Set only when `sender` is [`SenderRole::Human`].
    pub agent_name: Option<String>,
}

impl ChatMessage {
    /// Create a new chat message.
    ///
    /// `agent_name` is dropped unless the sender is a human agent.
    pub fn new(
        content: MessageContent,
        sender: SenderRole,
        timestamp: Timestamp,
        agent_name: Option<String>,
    ) -> Self {
        let agent_name = match sender {
            SenderRole::Human => agent_name,
            _ => None,
        };
        Self {
            content,
            sender,
            timestamp,
            agent_name,
        }
    }

    /// Server-authored system notice.
    pub fn system(text: String, timestamp: Timestamp) -> Self {
        Self::new(
            MessageContent::new(text),
            SenderRole::System,
            timestamp,
            None,
        )
    }
}

/// A queued ticket for a room awaiting an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanRequest {
    pub room_id: RoomId,
    pub user_id: ParticipantId,
    pub user_name: String,
    pub user_email: Option<String>,
    pub issue: String,
    pub timestamp: Timestamp,
    pub priority: Priority,
}

/// One conversation between a user and, optionally, an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Owning user connection
    pub user_id: ParticipantId,
    pub user_name: String,
    pub user_email: Option<String>,
    pub status: RoomStatus,
    pub agent: Option<AgentAssignment>,
    /// Live escalation ticket, present only while `Pending`.
    pub human_request: Option<HumanRequest>,
    pub start_time: Timestamp,
    pub last_activity: Timestamp,
    /// Append-only history
    pub messages: Vec<ChatMessage>,
}

impl Room {
    /// Create a new active room owned by `user_id`.
    pub fn new(
        id: RoomId,
        user_id: ParticipantId,
        user_name: String,
        user_email: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            user_name,
            user_email,
            status: RoomStatus::Active,
            agent: None,
            human_request: None,
            start_time: created_at,
            last_activity: created_at,
            messages: Vec::new(),
        }
    }

    /// Append a message and bump `last_activity`.
    ///
    /// Closed rooms still accept messages.
    pub fn append(&mut self, message: ChatMessage) {
        self.last_activity = message.timestamp;
        self.messages.push(message);
    }

    /// Move the room to `Pending` and open a ticket for it.
    ///
    /// A room that is already pending has its ticket replaced, so at most one
    /// ticket exists per room. Escalating starts a new cycle: any previous
    /// agent assignment is dropped. Appends the "Human agent requested" notice.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Closed` if the room is closed.
    pub fn escalate(
        &mut self,
        details: TicketDetails,
        at: Timestamp,
    ) -> Result<Escalation, RoomError> {
        if self.status == RoomStatus::Closed {
            return Err(RoomError::Closed);
        }
        let request = HumanRequest {
            room_id: self.id.clone(),
            user_id: self.user_id.clone(),
            user_name: details.user_name,
            user_email: details.user_email,
            issue: details.issue,
            timestamp: at,
            priority: Priority::default(),
        };
        self.status = RoomStatus::Pending;
        self.agent = None;
        self.human_request = Some(request.clone());
        let notice = ChatMessage::system(HUMAN_REQUESTED_NOTICE.to_string(), at);
        self.append(notice.clone());
        Ok(Escalation { request, notice })
    }

    /// Claim a pending room for an agent.
    ///
    /// Returns the ticket that was withdrawn.
    ///
    /// # Errors
    ///
    /// * `RoomError::AlreadyTaken` if another agent holds the room
    /// * `RoomError::NotAwaitingAgent` if the room was never escalated
    /// * `RoomError::Closed` if the room is closed
    pub fn assign_agent(
        &mut self,
        assignment: AgentAssignment,
    ) -> Result<Option<HumanRequest>, RoomError> {
        match (self.status, &self.agent) {
            (RoomStatus::Pending, _) => {
                self.status = RoomStatus::Active;
                self.agent = Some(assignment);
                Ok(self.human_request.take())
            }
            (RoomStatus::Active, Some(current)) => Err(RoomError::AlreadyTaken {
                agent_name: current.agent_name.clone(),
            }),
            (RoomStatus::Active, None) => Err(RoomError::NotAwaitingAgent {
                status: self.status,
            }),
            (RoomStatus::Closed, _) => Err(RoomError::Closed),
        }
    }

    /// Close the room, clearing the agent binding and any live ticket.
    ///
    /// Appends and returns the "Chat ended by ..." notice.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Closed` if the room is already closed.
    pub fn close(&mut self, ended_by: &str, at: Timestamp) -> Result<ChatMessage, RoomError> {
        if self.status == RoomStatus::Closed {
            return Err(RoomError::Closed);
        }
        self.status = RoomStatus::Closed;
        self.agent = None;
        self.human_request = None;
        let notice = ChatMessage::system(format!("Chat ended by {ended_by}"), at);
        self.append(notice.clone());
        Ok(notice)
    }

    /// Name of the agent currently handling the room.
    pub fn agent_name(&self) -> Option<&str> {
        self.agent.as_ref().map(|a| a.agent_name.as_str())
    }

    /// The subset of room state needed to address outbound frames.
    pub fn routing(&self) -> RoomRouting {
        RoomRouting {
            room_id: self.id.clone(),
            user_id: self.user_id.clone(),
            status: self.status,
            agent: self.agent.clone(),
        }
    }
}

/// What a user supplies when asking for a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDetails {
    pub user_name: String,
    pub user_email: Option<String>,
    pub issue: String,
}

/// Result of a successful escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    pub request: HumanRequest,
    /// The "Human agent requested" notice appended to the room.
    pub notice: ChatMessage,
}

/// Addressing information for a room, detached from its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRouting {
    pub room_id: RoomId,
    pub user_id: ParticipantId,
    pub status: RoomStatus,
    pub agent: Option<AgentAssignment>,
}
