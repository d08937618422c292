//! UseCase 層のエラー定義
//!
//! 各エラーは `code()` でクライアントに返す安定したエラーコードを持つ。
//! Infrastructure 由来のエラー（`RepositoryError`）は汎用の `*Error` コードに包まれる。

use thiserror::Error;

use crate::domain::{NotInRoom, RateLimited, RepositoryError};

/// クライアントに返すエラーコード
pub trait ErrorCode {
    /// ワイヤー上のエラーコード（例: `"NicknameTaken"`）
    fn code(&self) -> &'static str;

    /// 基盤側の障害か（利用者の操作起因のエラーは false）
    fn is_internal(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("this room requires a valid password")]
    PasswordRequired,

    #[error("nickname '{0}' is already taken")]
    NicknameTaken(String),

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for JoinRoomError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::PasswordRequired => "PasswordRequired",
            Self::NicknameTaken(_) => "NicknameTaken",
            Self::Internal(_) => "JoinRoomError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for JoinRoomError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error(transparent)]
    NotInRoom(#[from] NotInRoom),

    #[error(transparent)]
    RateLimit(#[from] RateLimited),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("parent message {0} does not exist in this room")]
    UnknownParent(i64),

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for SendMessageError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom(_) => "NotInRoom",
            Self::RateLimit(_) => "RateLimit",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::UnknownParent(_) | Self::Internal(_) => "SendMessageError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for SendMessageError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomInfoError {
    #[error(transparent)]
    NotInRoom(#[from] NotInRoom),

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for GetRoomInfoError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom(_) => "NotInRoom",
            Self::Internal(_) => "GetRoomInfoError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for GetRoomInfoError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateRoomError {
    #[error(transparent)]
    NotInRoom(#[from] NotInRoom),

    #[error("the default room cannot have a password")]
    DefaultRoomNoPassword,

    #[error("only the room creator can update this room")]
    NotCreator,

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for UpdateRoomError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom(_) => "NotInRoom",
            Self::DefaultRoomNoPassword => "DefaultRoomNoPassword",
            Self::NotCreator => "NotCreator",
            Self::Internal(_) => "UpdateRoomError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for UpdateRoomError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreatePollError {
    #[error(transparent)]
    NotInRoom(#[from] NotInRoom),

    #[error("{0}")]
    InvalidParams(String),

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for CreatePollError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom(_) => "NotInRoom",
            Self::InvalidParams(_) => "InvalidParams",
            Self::Internal(_) => "CreatePollError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for CreatePollError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error(transparent)]
    NotInRoom(#[from] NotInRoom),

    #[error("{0}")]
    InvalidParams(String),

    #[error("poll {0} not found")]
    PollNotFound(i64),

    #[error("poll {0} has expired")]
    PollExpired(i64),

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for VoteError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom(_) => "NotInRoom",
            Self::InvalidParams(_) => "InvalidParams",
            Self::PollNotFound(_) => "PollNotFound",
            Self::PollExpired(_) => "PollExpired",
            Self::Internal(_) => "VoteError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for VoteError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::PollNotFound(id) => Self::PollNotFound(id),
            RepositoryError::OptionNotInPoll { .. } => Self::InvalidParams(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetPollResultsError {
    #[error("{0}")]
    InvalidParams(String),

    #[error("poll {0} not found")]
    PollNotFound(i64),

    #[error("{0}")]
    Internal(String),
}

impl ErrorCode for GetPollResultsError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidParams(_) => "InvalidParams",
            Self::PollNotFound(_) => "PollNotFound",
            Self::Internal(_) => "GetPollResultsError",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<RepositoryError> for GetPollResultsError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// HTTP の履歴・在室者取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomQueryError {
    #[error("{0}")]
    InvalidRoomId(String),

    #[error("{0}")]
    Internal(String),
}

impl From<RepositoryError> for RoomQueryError {
    fn from(e: RepositoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_generic_codes() {
        // テスト項目: 永続化層のエラーはユースケースごとの汎用コードに変換される
        // given (前提条件):
        let failure = RepositoryError::Storage("disk full".to_string());

        // when (操作):
        let join: JoinRoomError = failure.clone().into();
        let send: SendMessageError = failure.clone().into();
        let update: UpdateRoomError = failure.clone().into();
        let poll: CreatePollError = failure.clone().into();
        let vote: VoteError = failure.clone().into();

        // then (期待する結果):
        assert_eq!(join.code(), "JoinRoomError");
        assert_eq!(send.code(), "SendMessageError");
        assert_eq!(update.code(), "UpdateRoomError");
        assert_eq!(poll.code(), "CreatePollError");
        assert_eq!(vote.code(), "VoteError");
        assert!(join.is_internal());
        assert_eq!(join.to_string(), "storage failure: disk full");
    }

    #[test]
    fn test_contention_errors_are_not_internal() {
        // テスト項目: 利用者起因のエラーは internal 扱いにならない
        // given (前提条件):
        let errors: Vec<Box<dyn ErrorCode>> = vec![
            Box::new(JoinRoomError::NicknameTaken("alice".to_string())),
            Box::new(JoinRoomError::PasswordRequired),
            Box::new(SendMessageError::RateLimit(RateLimited {
                retry_after_millis: 10,
            })),
            Box::new(VoteError::PollExpired(1)),
        ];

        // when (操作):
        let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();

        // then (期待する結果):
        assert_eq!(
            codes,
            vec!["NicknameTaken", "PasswordRequired", "RateLimit", "PollExpired"]
        );
        assert!(errors.iter().all(|e| !e.is_internal()));
    }

    #[test]
    fn test_vote_error_keeps_poll_not_found() {
        // テスト項目: 投票が見つからない永続化エラーは PollNotFound として扱われる
        // given (前提条件):
        let missing = RepositoryError::PollNotFound(42);

        // when (操作):
        let error: VoteError = missing.into();

        // then (期待する結果):
        assert_eq!(error, VoteError::PollNotFound(42));
        assert_eq!(error.code(), "PollNotFound");
    }
}
