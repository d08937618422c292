//! UseCase: ルームの履歴取得（HTTP API 用）

use std::sync::Arc;

use crate::domain::{ChatMessage, MessageRepository, RoomId};

use super::error::RoomQueryError;

/// 既定の取得件数
pub const DEFAULT_HISTORY_PAGE: usize = 20;

/// 取得件数の上限
pub const MAX_HISTORY_PAGE: usize = 100;

pub struct GetRecentMessagesUseCase {
    message_repository: Arc<dyn MessageRepository>,
}

impl GetRecentMessagesUseCase {
    pub fn new(message_repository: Arc<dyn MessageRepository>) -> Self {
        Self { message_repository }
    }

    /// 最近のメッセージを古い順で返す
    ///
    /// `limit` は 1..=100 に丸められる（省略時は 20）。
    pub async fn execute(
        &self,
        room_id: &str,
        limit: Option<usize>,
    ) -> Result<(RoomId, Vec<ChatMessage>), RoomQueryError> {
        let room_id = RoomId::new(room_id.to_string())
            .map_err(|e| RoomQueryError::InvalidRoomId(e.to_string()))?;
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_PAGE)
            .clamp(1, MAX_HISTORY_PAGE);

        let messages = self
            .message_repository
            .get_recent_messages(&room_id, limit)
            .await?;
        Ok((room_id, messages))
    }
}
