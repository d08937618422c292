//! RoomRepository のインメモリ実装

use async_trait::async_trait;

use crate::domain::{RepositoryError, Room, RoomId, RoomRepository, RoomUpdate};

use super::InMemoryChatRepository;

#[async_trait]
impl RoomRepository for InMemoryChatRepository {
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        Ok(self.state.lock().await.rooms.get(room_id).cloned())
    }

    async fn ensure_room(&self, room: Room) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .await
            .rooms
            .entry(room.id.clone())
            .or_insert(room);
        Ok(())
    }

    async fn update_room(
        &self,
        room_id: &RoomId,
        update: RoomUpdate,
    ) -> Result<Room, RepositoryError> {
        let mut state = self.state.lock().await;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))?;
        room.apply(&update);
        Ok(room.clone())
    }
}
