//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 送信頻度制限、ハイライト判定、返信先の検証、保存とブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 送信者を含むルーム全員に保存済みのメッセージが届くことを保証
//! - 見出し形式の本文が必ずハイライトされることを保証
//! - 制限に達した送信が保存もブロードキャストもされないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：通常のメッセージ、見出し形式のメッセージ、返信
//! - 異常系：未入室、送信頻度制限、空の本文、別ルームへの返信
//! - エッジケース：ウィンドウ経過後の再送信

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, MessageId, MessageRepository, MessageText, NewMessage,
    RateLimiter, ServerEvent, Session, Timestamp, resolve_highlight,
};

use super::{error::SendMessageError, room_coordinator::RoomCoordinator};

/// 送信内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    /// クライアントが付けた相関 ID（ブロードキャストにそのまま載せる）
    pub client_id: Option<String>,
    pub parent_message_id: Option<i64>,
    pub is_highlighted: bool,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    coordinator: Arc<RoomCoordinator>,
    /// Repository（データアクセス層の抽象化）
    message_repository: Arc<dyn MessageRepository>,
    rate_limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        coordinator: Arc<RoomCoordinator>,
        message_repository: Arc<dyn MessageRepository>,
        rate_limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinator,
            message_repository,
            rate_limiter,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 保存されたメッセージ
    /// * `Err(SendMessageError)` - 送信失敗（保存もブロードキャストもされない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session: &Session,
        outgoing: OutgoingMessage,
    ) -> Result<ChatMessage, SendMessageError> {
        // 1. 入室確認
        let (room_id, nickname) = session.joined()?;

        // 2. 送信頻度制限
        self.rate_limiter.check(connection_id).await?;

        // 3. 本文と返信先の検証
        let text = MessageText::new(outgoing.text)
            .map_err(|e| SendMessageError::InvalidRequest(e.to_string()))?;
        let parent_message_id = match outgoing.parent_message_id {
            Some(id) => {
                let parent = self.message_repository.get_message(MessageId::new(id)).await?;
                match parent {
                    Some(parent) if &parent.room_id == room_id => Some(parent.id),
                    _ => return Err(SendMessageError::UnknownParent(id)),
                }
            }
            None => None,
        };

        // 4. ハイライト判定と保存
        let is_highlighted = resolve_highlight(text.as_str(), outgoing.is_highlighted);
        let message = self
            .message_repository
            .save_message(NewMessage {
                room_id: room_id.clone(),
                nickname: nickname.clone(),
                text: text.into_string(),
                created_at: Timestamp::new(self.clock.now_millis()),
                parent_message_id,
                is_highlighted,
            })
            .await?;

        // 5. 送信者を含むルーム全員にブロードキャスト
        self.coordinator
            .broadcast_to_room(
                room_id,
                &ServerEvent::ChatMessage {
                    message: message.clone(),
                    client_id: outgoing.client_id,
                },
            )
            .await;

        tracing::debug!(
            "Message {} from '{}' stored in room '{}'",
            message.id,
            nickname,
            room_id
        );
        Ok(message)
    }
}
