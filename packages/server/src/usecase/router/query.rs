//! 参照系の操作（履歴・一覧・保留中チケット）

use crate::{
    domain::{HumanRequest, Room, RoomId},
    usecase::error::RouterError,
};

use super::Router;

impl Router {
    /// Full snapshot of one room, history included.
    pub async fn room_snapshot(&self, room_id: &RoomId) -> Result<Room, RouterError> {
        Ok(self.rooms.get_room(room_id).await?)
    }

    /// Every room, oldest first. Closed rooms are included.
    pub async fn list_rooms(&self) -> Vec<Room> {
        self.rooms.list_rooms().await
    }

    /// Live escalation tickets, oldest first.
    pub async fn pending_requests(&self) -> Vec<HumanRequest> {
        self.rooms.pending_requests().await
    }
}
