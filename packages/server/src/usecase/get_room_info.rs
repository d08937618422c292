//! UseCase: ルーム情報の取得

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomRepository, RoomView, Session};

use super::error::GetRoomInfoError;

pub struct GetRoomInfoUseCase {
    room_repository: Arc<dyn RoomRepository>,
}

impl GetRoomInfoUseCase {
    pub fn new(room_repository: Arc<dyn RoomRepository>) -> Self {
        Self { room_repository }
    }

    /// 入室中のルームの情報を、要求した接続から見た is_creator 付きで返す
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session: &Session,
    ) -> Result<RoomView, GetRoomInfoError> {
        let (room_id, _) = session.joined()?;
        let room = self.room_repository.get_room(room_id).await?;
        Ok(RoomView::of(room_id, room.as_ref(), connection_id))
    }
}
