//! InMemory ChatStore 実装
//!
//! 永続ストア（ChatStore trait）のインメモリ版。ルーター本体のルーム表とは
//! 独立したミラーで、ルーターから読み戻されることはありません。
//! 外部 DB を接続するまでのデフォルト実装、およびテスト用の観測点として使います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    AgentAssignment, ChatMessage, ChatStore, HumanRequest, Room, RoomId, RoomStatus, StoreError,
};

#[derive(Default)]
struct StoreState {
    rooms: HashMap<RoomId, Room>,
    human_requests: HashMap<RoomId, HumanRequest>,
}

/// インメモリの永続ストアミラー
#[derive(Default)]
pub struct InMemoryChatStore {
    state: Mutex<StoreState>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrored copy of a room, if present.
    pub async fn room(&self, room_id: &RoomId) -> Option<Room> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn insert_room(&self, room: Room) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn append_message(
        &self,
        room_id: RoomId,
        message: ChatMessage,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(&room_id)
            .ok_or(StoreError::RoomNotFound(room_id))?;
        room.append(message);
        Ok(())
    }

    async fn set_room_status(
        &self,
        room_id: RoomId,
        status: RoomStatus,
        agent: Option<AgentAssignment>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(&room_id)
            .ok_or(StoreError::RoomNotFound(room_id))?;
        room.status = status;
        room.agent = agent;
        Ok(())
    }

    async fn insert_human_request(&self, request: HumanRequest) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .human_requests
            .insert(request.room_id.clone(), request);
        Ok(())
    }

    async fn delete_human_request(&self, room_id: RoomId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.human_requests.remove(&room_id);
        Ok(())
    }

    async fn list_human_requests(&self) -> Result<Vec<HumanRequest>, StoreError> {
        let state = self.state.lock().await;
        let mut requests: Vec<HumanRequest> = state.human_requests.values().cloned().collect();
        requests.sort_by_key(|r| r.timestamp);
        Ok(requests)
    }

    async fn delete_room(&self, room_id: RoomId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.rooms.remove(&room_id);
        state.human_requests.remove(&room_id);
        Ok(())
    }
}
