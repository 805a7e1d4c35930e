//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## ロックの粒度
//!
//! ルーム表（`RwLock<HashMap<..>>`）はルームの追加・削除・検索にだけ使い、
//! 各ルームの状態は個別の `Mutex` で守ります。ルーム単位で排他されるため、
//! 同じルームへの `assign_agent` の競合やメッセージ追加の順序が保証され、
//! 別ルームの操作同士は互いを待ちません。
//!
//! 確定した変更はルームのロックを保持したまま `ChangeSink` に渡すため、
//! ミラー側でも同じルームの変更はメモリ上と同じ順序で並びます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    AgentAssignment, ChangeSink, ChatMessage, Escalation, HumanRequest, RepositoryError, Room,
    RoomChange, RoomId, RoomRepository, RoomRouting, TicketDetails, Timestamp,
};

type RoomSlot = Arc<Mutex<Room>>;

/// インメモリ Room Repository 実装
///
/// ドメイン層の RoomRepository trait を実装します（依存性の逆転）。
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, RoomSlot>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, room_id: &RoomId) -> Result<RoomSlot, RepositoryError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.clone()))
    }

    async fn snapshot_all(&self) -> Vec<Room> {
        let slots: Vec<RoomSlot> = {
            let rooms = self.rooms.read().await;
            rooms.values().cloned().collect()
        };
        let mut snapshots = Vec::with_capacity(slots.len());
        for slot in slots {
            snapshots.push(slot.lock().await.clone());
        }
        snapshots.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        snapshots
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn insert_room(&self, room: Room, sink: &dyn ChangeSink) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.id) {
            return Err(RepositoryError::DuplicateRoomId(room.id));
        }
        sink.record(RoomChange::InsertRoom(room.clone()));
        rooms.insert(room.id.clone(), Arc::new(Mutex::new(room)));
        Ok(())
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let slot = self.slot(room_id).await?;
        let room = slot.lock().await;
        Ok(room.clone())
    }

    async fn get_routing(&self, room_id: &RoomId) -> Result<RoomRouting, RepositoryError> {
        let slot = self.slot(room_id).await?;
        let room = slot.lock().await;
        Ok(room.routing())
    }

    async fn list_rooms(&self) -> Vec<Room> {
        self.snapshot_all().await
    }

    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
        sink: &dyn ChangeSink,
    ) -> Result<RoomRouting, RepositoryError> {
        let slot = self.slot(room_id).await?;
        let mut room = slot.lock().await;
        room.append(message.clone());
        sink.record(RoomChange::AppendMessage {
            room_id: room_id.clone(),
            message,
        });
        Ok(room.routing())
    }

    async fn escalate(
        &self,
        room_id: &RoomId,
        details: TicketDetails,
        at: Timestamp,
        sink: &dyn ChangeSink,
    ) -> Result<(RoomRouting, Escalation), RepositoryError> {
        let slot = self.slot(room_id).await?;
        let mut room = slot.lock().await;
        let escalation = room.escalate(details, at)?;
        sink.record(RoomChange::SetRoomStatus {
            room_id: room_id.clone(),
            status: room.status,
            agent: None,
        });
        sink.record(RoomChange::AppendMessage {
            room_id: room_id.clone(),
            message: escalation.notice.clone(),
        });
        sink.record(RoomChange::InsertHumanRequest(escalation.request.clone()));
        Ok((room.routing(), escalation))
    }

    async fn assign_agent(
        &self,
        room_id: &RoomId,
        assignment: AgentAssignment,
        sink: &dyn ChangeSink,
    ) -> Result<(RoomRouting, Option<HumanRequest>), RepositoryError> {
        let slot = self.slot(room_id).await?;
        let mut room = slot.lock().await;
        let withdrawn = room.assign_agent(assignment.clone())?;
        sink.record(RoomChange::SetRoomStatus {
            room_id: room_id.clone(),
            status: room.status,
            agent: Some(assignment),
        });
        sink.record(RoomChange::DeleteHumanRequest(room_id.clone()));
        Ok((room.routing(), withdrawn))
    }

    async fn close_room(
        &self,
        room_id: &RoomId,
        ended_by: &str,
        at: Timestamp,
        sink: &dyn ChangeSink,
    ) -> Result<(RoomRouting, ChatMessage), RepositoryError> {
        let slot = self.slot(room_id).await?;
        let mut room = slot.lock().await;
        let notice = room.close(ended_by, at)?;
        sink.record(RoomChange::SetRoomStatus {
            room_id: room_id.clone(),
            status: room.status,
            agent: None,
        });
        sink.record(RoomChange::AppendMessage {
            room_id: room_id.clone(),
            message: notice.clone(),
        });
        sink.record(RoomChange::DeleteHumanRequest(room_id.clone()));
        Ok((room.routing(), notice))
    }

    async fn remove_room(&self, room_id: &RoomId, sink: &dyn ChangeSink) -> Option<Room> {
        let slot = {
            let mut rooms = self.rooms.write().await;
            rooms.remove(room_id)?
        };
        let room = slot.lock().await;
        sink.record(RoomChange::DeleteHumanRequest(room_id.clone()));
        sink.record(RoomChange::DeleteRoom(room_id.clone()));
        Some(room.clone())
    }

    async fn pending_requests(&self) -> Vec<HumanRequest> {
        let mut requests: Vec<HumanRequest> = self
            .snapshot_all()
            .await
            .into_iter()
            .filter_map(|room| room.human_request)
            .collect();
        requests.sort_by_key(|r| r.timestamp);
        requests
    }
}
