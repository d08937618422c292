//! Room Registry
//!
//! ルームごとの在室接続（接続 ID → ニックネーム）をメモリ上で管理します。
//! 「誰がどのルームにいるか」の唯一の情報源。
//!
//! - エントリは最初の入室で作成され、空になった時点で削除される
//! - ルーム内のニックネームは常に一意（`try_add` が保証する）
//! - 在室順（入室順）を保持する

use std::collections::HashMap;

use super::{ConnectionId, Nickname, RegistryError, RoomId};

/// 在室者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub nickname: Nickname,
}

/// 退室処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// 在室していなかった
    NotMember,
    /// 退室した（`room_emptied` = 最後の 1 人だった）
    Removed { room_emptied: bool },
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Vec<Member>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在室者を登録
    ///
    /// 同じ接続が既に在室している場合はニックネームを置き換える。
    /// 他の接続が同じニックネームを使っている場合はエラー。
    pub fn try_add(
        &mut self,
        room_id: RoomId,
        connection_id: ConnectionId,
        nickname: Nickname,
    ) -> Result<(), RegistryError> {
        let members = self.rooms.entry(room_id).or_default();

        if let Some(holder) = members
            .iter()
            .find(|m| m.nickname == nickname && m.connection_id != connection_id)
        {
            return Err(RegistryError::NicknameHeld {
                nickname: nickname.into_string(),
                holder: holder.connection_id.as_str().to_string(),
            });
        }

        match members
            .iter_mut()
            .find(|m| m.connection_id == connection_id)
        {
            Some(existing) => existing.nickname = nickname,
            None => members.push(Member {
                connection_id,
                nickname,
            }),
        }
        Ok(())
    }

    /// 在室者を削除（空になったルームのエントリも削除する）
    pub fn remove(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Removal {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return Removal::NotMember;
        };
        let Some(position) = members
            .iter()
            .position(|m| &m.connection_id == connection_id)
        else {
            return Removal::NotMember;
        };

        members.remove(position);
        let room_emptied = members.is_empty();
        if room_emptied {
            self.rooms.remove(room_id);
        }
        Removal::Removed { room_emptied }
    }

    /// ニックネームを使用中の接続
    pub fn find_by_nickname(&self, room_id: &RoomId, nickname: &Nickname) -> Option<ConnectionId> {
        self.rooms.get(room_id).and_then(|members| {
            members
                .iter()
                .find(|m| &m.nickname == nickname)
                .map(|m| m.connection_id.clone())
        })
    }

    /// 接続が在室しているルーム
    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.rooms
            .iter()
            .find(|(_, members)| members.iter().any(|m| &m.connection_id == connection_id))
            .map(|(room_id, _)| room_id.clone())
    }

    /// 在室ニックネーム一覧（入室順）
    pub fn nicknames(&self, room_id: &RoomId) -> Vec<Nickname> {
        self.members(room_id)
            .iter()
            .map(|m| m.nickname.clone())
            .collect()
    }

    /// 在室接続 ID 一覧（入室順）
    pub fn connection_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.members(room_id)
            .iter()
            .map(|m| m.connection_id.clone())
            .collect()
    }

    pub fn members(&self, room_id: &RoomId) -> &[Member] {
        self.rooms.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.members(room_id).len()
    }

    pub fn contains(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        self.members(room_id)
            .iter()
            .any(|m| &m.connection_id == connection_id)
    }

    /// 誰かが在室しているルームの数
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
