//! RoomCoordinator: 在室状態（メモリ）とルームの永続化状態を一元管理する
//!
//! 入室・退室・ルームのリセットはすべてここを通る。
//!
//! ## 直列化
//!
//! 同じルームに対する入室・退室・リセットはルームごとの非同期ロックで直列化される。
//! ルームを移動する場合は移動元と移動先の両方のロックを RoomId の昇順で取得する。
//! これにより「空になったルームの古い状態を 2 つの接続が同時にリセットする」競合は起きない。
//!
//! ## ニックネームの奪還
//!
//! 入室しようとしたニックネームを別の接続が使っている場合、その接続に生存確認を行う。
//! 応答があれば NicknameTaken、タイムアウトまたは接続が存在しなければ
//! その接続を退室させて切断し、ニックネームを引き継ぐ。
//!
//! ## ルームのリセット
//!
//! 在室者が 0 人になったルームは、メッセージ（と付随する投票）が全て削除され、
//! パスワードと作成者がクリアされる。

use std::{collections::HashMap, sync::Arc, time::Duration};

use hiroba_shared::time::Clock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    ConnectionId, Liveness, LivenessProbe, MessagePusher, MessageRepository, Nickname, Removal,
    RepositoryError, Room, RoomId, RoomRegistry, RoomRepository, RoomUpdate, RoomView,
    ServerEvent, Timestamp,
};

use super::error::JoinRoomError;

/// 入室の結果
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// 入室後のルーム
    pub room: Room,
    /// 移動元のルーム（別のルームから移動した場合）
    pub left: Option<RoomId>,
    /// ニックネームを奪還された接続
    pub evicted: Option<ConnectionId>,
}

/// 保持中のルームロック
struct RoomGuard {
    room_id: RoomId,
    _guard: OwnedMutexGuard<()>,
}

pub struct RoomCoordinator {
    /// 在室状態（誰がどのルームにいるか）
    registry: Mutex<RoomRegistry>,
    /// ルームごとの入退室ロック
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
    room_repository: Arc<dyn RoomRepository>,
    message_repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    liveness_probe: Arc<dyn LivenessProbe>,
    probe_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl RoomCoordinator {
    pub fn new(
        room_repository: Arc<dyn RoomRepository>,
        message_repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        liveness_probe: Arc<dyn LivenessProbe>,
        probe_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry: Mutex::new(RoomRegistry::new()),
            room_locks: Mutex::new(HashMap::new()),
            room_repository,
            message_repository,
            message_pusher,
            liveness_probe,
            probe_timeout,
            clock,
        }
    }

    /// ルームに入室する（`from` に在室中ならそこから移動する）
    ///
    /// 入室に失敗した場合、`from` の在室状態は変わらない。
    pub async fn switch_room(
        &self,
        connection_id: &ConnectionId,
        from: Option<&RoomId>,
        to: &RoomId,
        nickname: &Nickname,
        password: Option<&str>,
    ) -> Result<Admission, JoinRoomError> {
        let mut rooms = vec![to];
        rooms.extend(from);
        let guards = self.lock_rooms(&rooms).await;

        let result = self
            .admit_locked(connection_id, from, to, nickname, password)
            .await;

        self.unlock_rooms(guards).await;
        result
    }

    async fn admit_locked(
        &self,
        connection_id: &ConnectionId,
        from: Option<&RoomId>,
        room_id: &RoomId,
        nickname: &Nickname,
        password: Option<&str>,
    ) -> Result<Admission, JoinRoomError> {
        // 1. 在室数
        let live_members = self.registry.lock().await.member_count(room_id);

        // 2. 誰もいないのに前回の状態が残っていればリセット
        let mut room = self.room_repository.get_room(room_id).await?;
        if live_members == 0 && room.as_ref().is_some_and(Room::carries_session_state) {
            tracing::info!("Room '{}' is empty but carries stale state, resetting", room_id);
            self.reset_room(room_id).await?;
            room = self.room_repository.get_room(room_id).await?;
        }

        // 3. パスワード確認
        if let Some(room) = &room
            && !room.admits(password)
        {
            return Err(JoinRoomError::PasswordRequired);
        }

        // 4. ニックネームの重複確認（生存確認による奪還）
        let holder = self
            .registry
            .lock()
            .await
            .find_by_nickname(room_id, nickname)
            .filter(|holder| holder != connection_id);
        let evicted = match holder {
            Some(holder) => Some(self.reclaim_nickname(room_id, nickname, holder).await?),
            None => None,
        };

        // 5. ルームの作成・作成者の設定
        match self.room_repository.get_room(room_id).await? {
            None => {
                let now = Timestamp::new(self.clock.now_millis());
                self.room_repository
                    .ensure_room(Room::new(room_id.clone(), Some(connection_id.clone()), now))
                    .await?;
                tracing::info!("Room '{}' created by '{}'", room_id, connection_id);
            }
            Some(existing) if existing.creator.is_none() => {
                self.room_repository
                    .update_room(room_id, RoomUpdate::adopt_creator(connection_id.clone()))
                    .await?;
                tracing::info!("'{}' adopted as creator of room '{}'", connection_id, room_id);
            }
            Some(_) => {}
        }

        // 移動元から退室
        let left = match from.filter(|from| *from != room_id) {
            Some(from) => {
                self.release_locked(from, connection_id).await;
                Some(from.clone())
            }
            None => None,
        };

        // 6. 登録
        self.registry
            .lock()
            .await
            .try_add(room_id.clone(), connection_id.clone(), nickname.clone())
            .map_err(|_| JoinRoomError::NicknameTaken(nickname.to_string()))?;

        let room = self
            .room_repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))?;

        tracing::info!(
            "'{}' joined room '{}' as '{}'",
            connection_id,
            room_id,
            nickname
        );

        Ok(Admission {
            room,
            left,
            evicted,
        })
    }

    /// ニックネームを使用中の接続に生存確認を行い、応答がなければ退室・切断させる
    async fn reclaim_nickname(
        &self,
        room_id: &RoomId,
        nickname: &Nickname,
        holder: ConnectionId,
    ) -> Result<ConnectionId, JoinRoomError> {
        match self
            .liveness_probe
            .probe(&holder, self.probe_timeout)
            .await
        {
            Liveness::Alive => {
                tracing::debug!(
                    "Nickname '{}' in room '{}' is held by live connection '{}'",
                    nickname,
                    room_id,
                    holder
                );
                Err(JoinRoomError::NicknameTaken(nickname.to_string()))
            }
            Liveness::Dead => {
                tracing::info!(
                    "Reclaiming nickname '{}' in room '{}' from unresponsive connection '{}'",
                    nickname,
                    room_id,
                    holder
                );
                self.release_locked(room_id, &holder).await;
                self.message_pusher.disconnect(&holder).await;
                Ok(holder)
            }
        }
    }

    /// ルームから退室する
    pub async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Removal {
        let guards = self.lock_rooms(&[room_id]).await;
        let removal = self.release_locked(room_id, connection_id).await;
        self.unlock_rooms(guards).await;
        removal
    }

    /// 接続が在室しているルームから退室する（切断時）
    pub async fn leave_connection(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let room_id = self.registry.lock().await.room_of(connection_id)?;
        match self.leave(&room_id, connection_id).await {
            Removal::Removed { .. } => Some(room_id),
            Removal::NotMember => None,
        }
    }

    /// 在室状態から削除し、空になればリセット、そうでなければ在室者一覧を通知する
    ///
    /// 呼び出し側がルームのロックを保持していること。
    async fn release_locked(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Removal {
        let removal = self.registry.lock().await.remove(room_id, connection_id);
        match removal {
            Removal::NotMember => {}
            Removal::Removed { room_emptied: true } => {
                tracing::info!("'{}' left room '{}', room is now empty", connection_id, room_id);
                if let Err(e) = self.reset_room(room_id).await {
                    tracing::error!("Failed to reset empty room '{}': {}", room_id, e);
                }
            }
            Removal::Removed {
                room_emptied: false,
            } => {
                tracing::info!("'{}' left room '{}'", connection_id, room_id);
                self.broadcast_room_users(room_id).await;
            }
        }
        removal
    }

    /// ルームのリセット（メッセージ削除、パスワード・作成者のクリア）
    async fn reset_room(&self, room_id: &RoomId) -> Result<(), RepositoryError> {
        let purged = self
            .message_repository
            .clear_messages_for_room(room_id)
            .await?;
        if self.room_repository.get_room(room_id).await?.is_some() {
            self.room_repository
                .update_room(room_id, RoomUpdate::reset())
                .await?;
        }
        tracing::info!(
            "Room '{}' reset: {} messages purged, password and creator cleared",
            room_id,
            purged
        );
        Ok(())
    }

    /// 在室ニックネーム一覧（入室順）
    pub async fn nicknames(&self, room_id: &RoomId) -> Vec<Nickname> {
        self.registry.lock().await.nicknames(room_id)
    }

    /// 在室接続一覧（入室順）
    pub async fn member_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.registry.lock().await.connection_ids(room_id)
    }

    /// 接続が在室しているルーム
    pub async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.registry.lock().await.room_of(connection_id)
    }

    /// ルームの全在室者にイベントを送信（一部の失敗は許容）
    pub async fn broadcast_to_room(&self, room_id: &RoomId, event: &ServerEvent) {
        let targets = self.member_ids(room_id).await;
        if let Err(e) = self.message_pusher.broadcast(targets, event).await {
            tracing::warn!(
                "Failed to broadcast '{}' to room '{}': {}",
                event.name(),
                room_id,
                e
            );
        }
    }

    /// 在室ニックネーム一覧を通知
    pub async fn broadcast_room_users(&self, room_id: &RoomId) {
        let nicknames = self.nicknames(room_id).await;
        self.broadcast_to_room(room_id, &ServerEvent::RoomUsers { nicknames })
            .await;
    }

    /// ルーム情報を在室者ごとに（is_creator を計算して）通知
    pub async fn broadcast_room_info(&self, room: &Room) {
        for member in self.member_ids(&room.id).await {
            let event = ServerEvent::RoomInfo(RoomView::of(&room.id, Some(room), &member));
            if let Err(e) = self.message_pusher.push_to(&member, &event).await {
                tracing::warn!("Failed to push room_info to '{}': {}", member, e);
            }
        }
    }

    /// ルームのロックを RoomId の昇順で取得（重複は 1 度だけ）
    async fn lock_rooms(&self, room_ids: &[&RoomId]) -> Vec<RoomGuard> {
        let mut ordered: Vec<&RoomId> = room_ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for room_id in ordered {
            let lock = {
                let mut locks = self.room_locks.lock().await;
                locks.entry(room_id.clone()).or_default().clone()
            };
            guards.push(RoomGuard {
                room_id: room_id.clone(),
                _guard: lock.lock_owned().await,
            });
        }
        guards
    }

    /// ロックを解放し、誰も待っていないロックを破棄
    async fn unlock_rooms(&self, guards: Vec<RoomGuard>) {
        let room_ids: Vec<RoomId> = guards.iter().map(|g| g.room_id.clone()).collect();
        drop(guards);

        let mut locks = self.room_locks.lock().await;
        for room_id in room_ids {
            if locks
                .get(&room_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                locks.remove(&room_id);
            }
        }
    }

    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.room_locks.lock().await.len()
    }
}
