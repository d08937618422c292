//! UseCase: 退室処理（クライアントからの明示的な退室）

use std::sync::Arc;

use crate::domain::{ConnectionId, Removal, RoomId, Session};

use super::room_coordinator::RoomCoordinator;

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    coordinator: Arc<RoomCoordinator>,
}

impl LeaveRoomUseCase {
    pub fn new(coordinator: Arc<RoomCoordinator>) -> Self {
        Self { coordinator }
    }

    /// 退室を実行（入室していなければ何もしない）
    ///
    /// # Returns
    ///
    /// 退室したルーム
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session: &mut Session,
    ) -> Option<RoomId> {
        let (room_id, _) = session.leave()?;
        match self.coordinator.leave(&room_id, connection_id).await {
            Removal::Removed { .. } => Some(room_id),
            Removal::NotMember => {
                tracing::debug!(
                    "'{}' was no longer registered in room '{}'",
                    connection_id,
                    room_id
                );
                None
            }
        }
    }
}
