//! サーバーからクライアントへ通知されるイベント
//!
//! 転送形式（JSON など）には依存しない。変換は Infrastructure 層が行う。

use super::{
    ChatMessage, ConnectionId, MessageId, Nickname, PollDetail, PollId, PollOptionId,
    PollResults, RoomView,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// 入室時の履歴（時系列順）
    History { messages: Vec<ChatMessage> },

    /// ルーム情報（受信者ごとの is_creator 付き）
    RoomInfo(RoomView),

    /// ルームの在室ニックネーム一覧
    RoomUsers { nicknames: Vec<Nickname> },

    /// 保存済みメッセージ（送信者が付けた相関 ID 付き）
    ChatMessage {
        message: ChatMessage,
        client_id: Option<String>,
    },

    /// パスワード変更によって履歴が消去された
    RoomRefresh { notice: String },

    /// 投票の告知メッセージ
    PollMessage {
        message: ChatMessage,
        poll: PollDetail,
    },

    /// 投票結果の更新
    PollResults {
        poll_id: PollId,
        message_id: MessageId,
        results: PollResults,
        voter: ConnectionId,
        user_vote: PollOptionId,
    },
}

impl ServerEvent {
    /// 転送時のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::History { .. } => "history",
            Self::RoomInfo(_) => "room_info",
            Self::RoomUsers { .. } => "room_users",
            Self::ChatMessage { .. } => "chat_message",
            Self::RoomRefresh { .. } => "room_refresh",
            Self::PollMessage { .. } => "poll_message",
            Self::PollResults { .. } => "poll_results",
        }
    }
}
