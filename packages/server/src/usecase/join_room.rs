//! UseCase: 入室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 入力の検証、入室後に送られるイベント（history, room_info, room_users）
//!
//! ### なぜこのテストが必要か
//! - 入室した接続だけが履歴とルーム情報を受け取り、在室者一覧はルーム全体に届くことを保証
//! - 入室に失敗した場合にセッションの状態が変わらないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新しいルームへの入室（作成者になる）
//! - 正常系：履歴のあるルームへの入室、別ルームへの移動
//! - 異常系：空のルーム ID・ニックネーム、使用中のニックネーム
//! - 異常系：永続化層の障害

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, MessageRepository, Nickname, RoomId, RoomView, ServerEvent,
    Session,
};

use super::{
    error::JoinRoomError,
    room_coordinator::{Admission, RoomCoordinator},
};

/// 入室のユースケース
pub struct JoinRoomUseCase {
    coordinator: Arc<RoomCoordinator>,
    message_repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    /// 入室時に送る履歴の件数
    history_limit: usize,
}

impl JoinRoomUseCase {
    pub fn new(
        coordinator: Arc<RoomCoordinator>,
        message_repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        history_limit: usize,
    ) -> Self {
        Self {
            coordinator,
            message_repository,
            message_pusher,
            history_limit,
        }
    }

    /// 入室を実行
    ///
    /// 既に別のルームに入室している場合はそのルームから移動する。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 入室する接続
    /// * `session` - 接続のセッション状態（成功時に Joined になる）
    /// * `room_id` - 入室するルーム（前後の空白は除去される）
    /// * `nickname` - ニックネーム（前後の空白は除去される）
    /// * `password` - パスワード（空文字列はパスワードなしとして扱う）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session: &mut Session,
        room_id: &str,
        nickname: &str,
        password: Option<&str>,
    ) -> Result<Admission, JoinRoomError> {
        // 1. 入力の検証
        let room_id = RoomId::new(room_id.to_string())
            .map_err(|e| JoinRoomError::InvalidRequest(e.to_string()))?;
        let nickname = Nickname::new(nickname.to_string())
            .map_err(|e| JoinRoomError::InvalidRequest(e.to_string()))?;
        let password = password.map(str::trim).filter(|p| !p.is_empty());

        // 2. 在室状態の更新（移動元からの退室を含む）
        let from = session.room_id().cloned();
        let admission = self
            .coordinator
            .switch_room(connection_id, from.as_ref(), &room_id, &nickname, password)
            .await?;
        session.enter(room_id.clone(), nickname);

        // 3. 入室した接続に履歴とルーム情報を送信
        let messages = self
            .message_repository
            .get_recent_messages(&room_id, self.history_limit)
            .await?;
        self.push(connection_id, ServerEvent::History { messages })
            .await;
        let view = RoomView::of(&room_id, Some(&admission.room), connection_id);
        self.push(connection_id, ServerEvent::RoomInfo(view)).await;

        // 4. ルーム全体に在室者一覧を通知
        self.coordinator.broadcast_room_users(&room_id).await;

        Ok(admission)
    }

    async fn push(&self, connection_id: &ConnectionId, event: ServerEvent) {
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!(
                "Failed to push '{}' to '{}': {}",
                event.name(),
                connection_id,
                e
            );
        }
    }
}
