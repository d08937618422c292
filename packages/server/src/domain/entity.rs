//! Entity 定義
//!
//! 永続化されるルーム・メッセージ・投票と、それらを組み立てた読み取りモデル。

use super::value_object::{
    ConnectionId, MessageId, Nickname, PollId, PollOptionId, RoomId, Timestamp,
};

/// ルーム（永続化される）
///
/// `password` と `creator` はルームが空になるたびにクリアされる（リセット）。
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    pub description: Option<String>,
    /// 平文で比較される共有パスワード（None = 公開ルーム）
    pub password: Option<String>,
    /// 作成者（または最初に管理者となった）接続
    pub creator: Option<ConnectionId>,
    pub created_at: Timestamp,
}

impl Room {
    /// 新しいルームを作成
    pub fn new(id: RoomId, creator: Option<ConnectionId>, created_at: Timestamp) -> Self {
        Self {
            id,
            name: None,
            description: None,
            password: None,
            creator,
            created_at,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_created_by(&self, connection_id: &ConnectionId) -> bool {
        self.creator.as_ref() == Some(connection_id)
    }

    /// 誰もいないのに前回の状態（パスワード・作成者）が残っているか
    pub fn carries_session_state(&self) -> bool {
        self.password.is_some() || self.creator.is_some()
    }

    /// 入力されたパスワードでルームに入れるか
    pub fn admits(&self, supplied: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(expected) => supplied == Some(expected.as_str()),
        }
    }

    /// 部分更新を適用
    pub fn apply(&mut self, update: &RoomUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(password) = &update.password {
            self.password = password.clone();
        }
        if let Some(creator) = &update.creator {
            self.creator = creator.clone();
        }
    }
}

/// ルームの部分更新
///
/// 各フィールド: `None` = 変更しない, `Some(None)` = クリア, `Some(Some(v))` = 設定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomUpdate {
    pub name: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub password: Option<Option<String>>,
    pub creator: Option<Option<ConnectionId>>,
}

impl RoomUpdate {
    /// ルームリセット（パスワードと作成者をクリア）
    pub fn reset() -> Self {
        Self {
            password: Some(None),
            creator: Some(None),
            ..Self::default()
        }
    }

    /// 作成者を設定
    pub fn adopt_creator(connection_id: ConnectionId) -> Self {
        Self {
            creator: Some(Some(connection_id)),
            ..Self::default()
        }
    }

    pub fn touches_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// クライアントに見せるルーム情報
///
/// パスワード本体と作成者の接続 ID は含めない。
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub id: RoomId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub has_password: bool,
    pub created_at: Option<Timestamp>,
    pub is_creator: bool,
}

impl RoomView {
    /// `viewer` から見たルーム情報を作成（レコードが無い場合は ID のみ）
    pub fn of(room_id: &RoomId, room: Option<&Room>, viewer: &ConnectionId) -> Self {
        match room {
            Some(room) => Self {
                id: room.id.clone(),
                name: room.name.clone(),
                description: room.description.clone(),
                has_password: room.has_password(),
                created_at: Some(room.created_at),
                is_creator: room.is_created_by(viewer),
            },
            None => Self {
                id: room_id.clone(),
                name: None,
                description: None,
                has_password: false,
                created_at: None,
                is_creator: false,
            },
        }
    }
}

/// 永続化済みのチャットメッセージ
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub nickname: Nickname,
    pub text: String,
    pub created_at: Timestamp,
    /// 返信先（同じルームのメッセージ、1 階層のみ）
    pub parent_message_id: Option<MessageId>,
    pub is_highlighted: bool,
}

/// 保存前のメッセージ
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub nickname: Nickname,
    pub text: String,
    pub created_at: Timestamp,
    pub parent_message_id: Option<MessageId>,
    pub is_highlighted: bool,
}

impl NewMessage {
    /// ID を割り当てて永続化済みメッセージにする
    pub fn into_stored(self, id: MessageId) -> ChatMessage {
        ChatMessage {
            id,
            room_id: self.room_id,
            nickname: self.nickname,
            text: self.text,
            created_at: self.created_at,
            parent_message_id: self.parent_message_id,
            is_highlighted: self.is_highlighted,
        }
    }
}

/// 投票（告知メッセージと 1:1）
#[derive(Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: PollId,
    pub message_id: MessageId,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Poll {
    /// 締め切りを過ぎているか（締め切りなしは常に false）
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

/// 投票の選択肢
#[derive(Debug, Clone, PartialEq)]
pub struct PollOption {
    pub id: PollOptionId,
    pub poll_id: PollId,
    pub text: String,
    /// 表示順（入力順）
    pub index: u32,
}

/// 1 票（(poll, voter) ごとに高々 1 つ）
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub option_id: PollOptionId,
    pub voter: ConnectionId,
    pub created_at: Timestamp,
}

/// 保存前の投票
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoll {
    pub message_id: MessageId,
    pub options: Vec<String>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// 選択肢ごとの集計
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTally {
    pub option: PollOption,
    pub vote_count: u64,
    /// 得票率（総数 0 のときは 0）
    pub vote_rate: f64,
}

/// 投票結果
#[derive(Debug, Clone, PartialEq)]
pub struct PollResults {
    pub poll_id: PollId,
    pub options: Vec<OptionTally>,
    pub total_votes: u64,
}

impl PollResults {
    pub fn count_for(&self, option_id: PollOptionId) -> Option<u64> {
        self.options
            .iter()
            .find(|tally| tally.option.id == option_id)
            .map(|tally| tally.vote_count)
    }

    pub fn contains_option(&self, option_id: PollOptionId) -> bool {
        self.count_for(option_id).is_some()
    }
}

/// 投票本体 + 集計結果
#[derive(Debug, Clone, PartialEq)]
pub struct PollDetail {
    pub poll: Poll,
    pub results: PollResults,
}

/// 投票の受付結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    /// 既存の票を置き換えた（改投）か
    pub changed: bool,
}
