//! Router: ルームのライフサイクルとメッセージ配送の中核
//!
//! ルーム表（RoomRepository）と接続レジストリを排他的に所有し、
//! セッションハンドラからの操作を受けて状態遷移・配送・外部連携を行います。
//!
//! - `lifecycle`: ルーム作成、エスカレーション、エージェントの参加、終了、削除、接続の登録
//! - `dispatch`: メッセージとタイピング表示の配送
//! - `query`: 履歴・一覧・保留中チケットの参照
//!
//! 呼び出し元の接続に返すフレームは戻り値で返し、
//! それ以外の接続宛てのフレームはレジストリ経由で送ります。

mod dispatch;
mod lifecycle;
mod query;

pub use dispatch::DEFLECTION_REPLY;

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{
        ChatMessage, ChatStore, HumanRequest, Notifier, Responder, RoomId, RoomRepository,
        SensitivityClassifier,
    },
    infrastructure::dto::websocket::ServerFrame,
};

use super::{mirror::StoreMirror, registry::ConnectionRegistry};

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_ALERT_RECIPIENT: &str = "support@example.com";

/// Tunables for the router.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Wait before an automated reply is delivered.
    pub reply_delay: Duration,
    /// Where escalation alerts are sent.
    pub alert_recipient: String,
    /// Escalate rooms whose user message matches a sensitive category.
    pub escalate_on_sensitive: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            reply_delay: DEFAULT_REPLY_DELAY,
            alert_recipient: DEFAULT_ALERT_RECIPIENT.to_string(),
            escalate_on_sensitive: false,
        }
    }
}

/// External collaborators the router depends on.
pub struct Collaborators {
    pub rooms: Arc<dyn RoomRepository>,
    pub store: Arc<dyn ChatStore>,
    pub notifier: Arc<dyn Notifier>,
    pub responder: Arc<dyn Responder>,
}

/// The core orchestrator shared by every session handler.
pub struct Router {
    rooms: Arc<dyn RoomRepository>,
    registry: ConnectionRegistry,
    classifier: SensitivityClassifier,
    responder: Arc<dyn Responder>,
    notifier: Arc<dyn Notifier>,
    mirror: StoreMirror,
    settings: RouterSettings,
}

impl Router {
    /// Create a router. Spawns the store mirror, so a Tokio runtime must be running.
    pub fn new(
        collaborators: Collaborators,
        classifier: SensitivityClassifier,
        settings: RouterSettings,
    ) -> Self {
        Self {
            rooms: collaborators.rooms,
            registry: ConnectionRegistry::new(),
            classifier,
            responder: collaborators.responder,
            notifier: collaborators.notifier,
            mirror: StoreMirror::spawn(collaborators.store),
            settings,
        }
    }

    /// Wait for every queued store write to be attempted.
    pub async fn flush_mirror(&self) {
        self.mirror.flush().await;
    }

    /// Send the escalation alert in the background; failures are only logged.
    fn spawn_alert(&self, request: &HumanRequest) {
        let notifier = self.notifier.clone();
        let recipient = self.settings.alert_recipient.clone();
        let subject = format!("New Support Request: {}", request.user_name);
        let body = alert_body(request);
        let room_id = request.room_id.clone();
        tokio::spawn(async move {
            match notifier.send_alert(&recipient, &subject, &body).await {
                Ok(()) => tracing::info!(%room_id, recipient, "escalation alert sent"),
                Err(e) => {
                    tracing::warn!(%room_id, recipient, error = %e, "escalation alert failed")
                }
            }
        });
    }
}

fn alert_body(request: &HumanRequest) -> String {
    format!(
        "A new support request has been received:\n\n\
         User: {}\n\
         Email: {}\n\
         Issue: {}\n\
         Room ID: {}\n\
         Time: {}\n\n\
         Please log in to the agent portal to assist this user.\n",
        request.user_name,
        request.user_email.as_deref().unwrap_or(""),
        request.issue,
        request.room_id,
        handoff_shared::time::millis_to_display(request.timestamp.value()),
    )
}

/// Outbound `message` frame for a stored chat message.
fn message_frame(room_id: &RoomId, message: &ChatMessage) -> ServerFrame {
    ServerFrame::Message {
        message: message.content.as_str().to_string(),
        sender: message.sender,
        timestamp: message.timestamp.to_rfc3339(),
        room_id: room_id.as_str().to_string(),
        agent_name: message.agent_name.clone(),
    }
}
