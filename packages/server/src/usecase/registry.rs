//! Connection Registry
//!
//! 接続中のユーザー・エージェント・管理者それぞれについて、参加者 ID から
//! 送信チャンネル（outbox）への対応を保持します。
//! 各セッションハンドラは outbox の受信側をソケットへ書き出すだけで、
//! 宛先の解決と配送は全てこのレジストリを経由します。

use std::{collections::HashMap, fmt};

use tokio::sync::{RwLock, mpsc};

use crate::{domain::ParticipantId, infrastructure::dto::websocket::ServerFrame};

use super::error::RegistryError;

/// Sending half of one connection's outbound queue.
pub type Outbox = mpsc::UnboundedSender<String>;

/// Which channel a connection arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Agent,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Default)]
struct Bindings {
    users: HashMap<ParticipantId, Outbox>,
    agents: HashMap<ParticipantId, Outbox>,
    admins: HashMap<ParticipantId, Outbox>,
}

impl Bindings {
    fn table(&self, role: Role) -> &HashMap<ParticipantId, Outbox> {
        match role {
            Role::User => &self.users,
            Role::Agent => &self.agents,
            Role::Admin => &self.admins,
        }
    }

    fn table_mut(&mut self, role: Role) -> &mut HashMap<ParticipantId, Outbox> {
        match role {
            Role::User => &mut self.users,
            Role::Agent => &mut self.agents,
            Role::Admin => &mut self.admins,
        }
    }
}

/// 接続レジストリ
#[derive(Default)]
pub struct ConnectionRegistry {
    bindings: RwLock<Bindings>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id` to `outbox` on the given channel.
    ///
    /// Rebinding the same connection is a no-op, and an id whose previous
    /// connection has gone away can be taken over.
    ///
    /// # Errors
    ///
    /// `RegistryError::AlreadyBound` if `id` belongs to a different live connection.
    pub async fn bind(
        &self,
        role: Role,
        id: ParticipantId,
        outbox: Outbox,
    ) -> Result<(), RegistryError> {
        let mut bindings = self.bindings.write().await;
        let table = bindings.table_mut(role);
        if let Some(existing) = table.get(&id)
            && !existing.is_closed()
            && !existing.same_channel(&outbox)
        {
            return Err(RegistryError::AlreadyBound { role, id });
        }
        table.insert(id, outbox);
        Ok(())
    }

    /// Returns `true` if a binding was removed.
    pub async fn unbind(&self, role: Role, id: &ParticipantId) -> bool {
        let mut bindings = self.bindings.write().await;
        bindings.table_mut(role).remove(id).is_some()
    }

    pub async fn lookup(&self, role: Role, id: &ParticipantId) -> Option<Outbox> {
        let bindings = self.bindings.read().await;
        bindings.table(role).get(id).cloned()
    }

    #[cfg(test)]
    pub async fn count(&self, role: Role) -> usize {
        self.bindings.read().await.table(role).len()
    }

    /// Deliver one frame to one connection.
    ///
    /// Returns `false` when the target is not bound or its connection is gone.
    /// Nothing is queued for later delivery.
    pub async fn send_to(&self, role: Role, id: &ParticipantId, frame: &ServerFrame) -> bool {
        let Some(payload) = encode(frame) else {
            return false;
        };
        let Some(outbox) = self.lookup(role, id).await else {
            tracing::debug!(%role, participant_id = %id, "delivery skipped: target not bound");
            return false;
        };
        if outbox.send(payload).is_err() {
            tracing::debug!(%role, participant_id = %id, "delivery skipped: connection closed");
            return false;
        }
        true
    }

    /// Deliver one frame to every connection of a role, optionally skipping one.
    ///
    /// Each recipient is independent; a failed send does not stop the others.
    /// Returns the number of successful deliveries.
    pub async fn broadcast(
        &self,
        role: Role,
        frame: &ServerFrame,
        except: Option<&ParticipantId>,
    ) -> usize {
        let Some(payload) = encode(frame) else {
            return 0;
        };
        let bindings = self.bindings.read().await;
        let mut delivered = 0;
        for (id, outbox) in bindings.table(role) {
            if except == Some(id) {
                continue;
            }
            if outbox.send(payload.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::warn!(%role, participant_id = %id, "broadcast to closed connection skipped");
            }
        }
        delivered
    }
}

fn encode(frame: &ServerFrame) -> Option<String> {
    match frame.encode() {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode outbound frame");
            None
        }
    }
}
