//! 永続ストアへの非同期ミラー
//!
//! ルーム表が確定した変更（`RoomChange`）をバックグラウンドタスクで ChatStore へ書き写します。
//! 書き込みは投入順に 1 つずつ実行され、失敗はログに残すだけで
//! 再試行もロールバックもしません（インメモリのルーム表が常に正）。

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::domain::{ChangeSink, ChatStore, RoomChange, StoreError};

enum Envelope {
    Write(RoomChange),
    Flush(oneshot::Sender<()>),
}

/// Ordered, fire-and-forget writer in front of a [`ChatStore`].
pub struct StoreMirror {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl StoreMirror {
    /// Start the background writer. Must be called inside a Tokio runtime.
    pub fn spawn(store: Arc<dyn ChatStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, rx));
        Self { tx }
    }

    /// Wait until every write submitted so far has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Envelope::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

impl ChangeSink for StoreMirror {
    /// Queue a write. Never blocks and never fails the caller.
    fn record(&self, change: RoomChange) {
        if let Err(mpsc::error::SendError(Envelope::Write(change))) =
            self.tx.send(Envelope::Write(change))
        {
            tracing::warn!(
                room_id = %change.room_id(),
                operation = change.name(),
                "store mirror stopped; write dropped"
            );
        }
    }
}

async fn run_writer(store: Arc<dyn ChatStore>, mut rx: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Write(change) => {
                let room_id = change.room_id().clone();
                let operation = change.name();
                if let Err(e) = apply(store.as_ref(), change).await {
                    tracing::warn!(%room_id, operation, error = %e, "store mirror write failed");
                }
            }
            Envelope::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("store mirror writer finished");
}

async fn apply(store: &dyn ChatStore, change: RoomChange) -> Result<(), StoreError> {
    match change {
        RoomChange::InsertRoom(room) => store.insert_room(room).await,
        RoomChange::AppendMessage { room_id, message } => {
            store.append_message(room_id, message).await
        }
        RoomChange::SetRoomStatus {
            room_id,
            status,
            agent,
        } => store.set_room_status(room_id, status, agent).await,
        RoomChange::InsertHumanRequest(request) => store.insert_human_request(request).await,
        RoomChange::DeleteHumanRequest(room_id) => store.delete_human_request(room_id).await,
        RoomChange::DeleteRoom(room_id) => store.delete_room(room_id).await,
    }
}
