//! UseCase: ルームの在室者一覧（HTTP API 用）

use std::sync::Arc;

use crate::domain::{Nickname, RoomId};

use super::{error::RoomQueryError, room_coordinator::RoomCoordinator};

pub struct GetRoomUsersUseCase {
    coordinator: Arc<RoomCoordinator>,
}

impl GetRoomUsersUseCase {
    pub fn new(coordinator: Arc<RoomCoordinator>) -> Self {
        Self { coordinator }
    }

    /// 在室ニックネーム一覧（入室順）
    pub async fn execute(&self, room_id: &str) -> Result<(RoomId, Vec<Nickname>), RoomQueryError> {
        let room_id = RoomId::new(room_id.to_string())
            .map_err(|e| RoomQueryError::InvalidRoomId(e.to_string()))?;
        let nicknames = self.coordinator.nicknames(&room_id).await;
        Ok((room_id, nicknames))
    }
}
