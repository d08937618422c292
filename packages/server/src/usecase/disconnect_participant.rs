//! UseCase: 接続の切断
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時の後片付け（退室、送信頻度制限の破棄、pusher からの登録解除）
//!
//! ### なぜこのテストが必要か
//! - 最後の在室者の切断でルームがリセットされることを保証
//! - 接続ごとの状態（レート制限のウィンドウ）が残り続けないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：入室中の接続の切断（残った在室者へ一覧を通知）
//! - 正常系：最後の在室者の切断（ルームのリセット）
//! - エッジケース：入室していない接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RateLimiter, RoomId};

use super::room_coordinator::RoomCoordinator;

/// 接続切断のユースケース
pub struct DisconnectParticipantUseCase {
    coordinator: Arc<RoomCoordinator>,
    rate_limiter: Arc<RateLimiter>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        coordinator: Arc<RoomCoordinator>,
        rate_limiter: Arc<RateLimiter>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            coordinator,
            rate_limiter,
            message_pusher,
        }
    }

    /// 切断処理を実行
    ///
    /// # Returns
    ///
    /// 退室したルーム（入室していなかった場合は None）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        // 1. 在室中のルームから退室（在室状態を正とする）
        let left = self.coordinator.leave_connection(connection_id).await;

        // 2. 送信頻度制限のウィンドウを破棄
        self.rate_limiter.detach(connection_id).await;

        // 3. MessagePusher から登録解除
        self.message_pusher.unregister_client(connection_id).await;

        tracing::info!("Connection '{}' closed", connection_id);
        left
    }
}
