//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("connection id must not be empty")]
    EmptyConnectionId,

    #[error("roomId must not be empty")]
    EmptyRoomId,

    #[error("roomId must be at most {max} characters")]
    RoomIdTooLong { max: usize },

    #[error("nickname must not be empty")]
    EmptyNickname,

    #[error("nickname must be at most {max} characters")]
    NicknameTooLong { max: usize },

    #[error("message text must not be empty")]
    EmptyMessage,

    #[error("message text must be at most {max} characters")]
    MessageTooLong { max: usize },
}

/// 永続化層（Persistence Gateway）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("poll {0} not found")]
    PollNotFound(i64),

    #[error("option {option_id} does not belong to poll {poll_id}")]
    OptionNotInPoll { poll_id: i64, option_id: i64 },

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' is not connected")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Registry の不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("nickname '{nickname}' is held by connection '{holder}'")]
    NicknameHeld { nickname: String, holder: String },
}

/// セッション状態に対して不正な操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connection has not joined a room")]
pub struct NotInRoom;

/// 送信頻度制限に達した
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sending messages too quickly, retry in {retry_after_millis} ms")]
pub struct RateLimited {
    pub retry_after_millis: i64,
}
