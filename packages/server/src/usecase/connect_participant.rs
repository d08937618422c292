//! UseCase: 接続の確立
//!
//! WebSocket の接続ごとに新しい ConnectionId を発行し、送信チャンネルと
//! 送信頻度制限のウィンドウを用意する。この時点ではどのルームにも入室していない。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, RateLimiter};

/// 接続確立のユースケース
pub struct ConnectParticipantUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 接続ごとの送信頻度制限
    rate_limiter: Arc<RateLimiter>,
}

impl ConnectParticipantUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            message_pusher,
            rate_limiter,
        }
    }

    /// 接続を登録し、発行した ConnectionId を返す
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionId::generate();

        // 1. MessagePusher にクライアントを登録
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;

        // 2. 送信頻度制限のウィンドウを作成
        self.rate_limiter.attach(&connection_id).await;

        tracing::info!("Connection '{}' established", connection_id);
        connection_id
    }
}
