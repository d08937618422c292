//! 接続ごとのセッション状態
//!
//! `Anonymous`（初期状態）→ `Joined(room, nickname)` → `Anonymous`（退室・切断）
//!
//! 入室中でなければ、メッセージ送信・ルーム更新・投票は受け付けない。

use super::{Nickname, NotInRoom, RoomId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Joined {
        room_id: RoomId,
        nickname: Nickname,
    },
}

impl Session {
    pub fn new() -> Self {
        Self::Anonymous
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined { .. })
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::Joined { room_id, .. } => Some(room_id),
            Self::Anonymous => None,
        }
    }

    /// 入室中であれば (ルーム, ニックネーム) を返す
    pub fn joined(&self) -> Result<(&RoomId, &Nickname), NotInRoom> {
        match self {
            Self::Joined { room_id, nickname } => Ok((room_id, nickname)),
            Self::Anonymous => Err(NotInRoom),
        }
    }

    /// `Joined` に遷移
    pub fn enter(&mut self, room_id: RoomId, nickname: Nickname) {
        *self = Self::Joined { room_id, nickname };
    }

    /// `Anonymous` に遷移し、直前のルームを返す
    pub fn leave(&mut self) -> Option<(RoomId, Nickname)> {
        match std::mem::take(self) {
            Self::Joined { room_id, nickname } => Some((room_id, nickname)),
            Self::Anonymous => None,
        }
    }
}
