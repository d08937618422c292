//! UseCase テスト用の MessagePusher / LivenessProbe と値のヘルパー

use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use hiroba_shared::time::ManualClock;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ConnectionId, Liveness, LivenessProbe, MessagePushError, MessagePusher, Nickname,
        PusherChannel, RoomId, ServerEvent, Session,
    },
    infrastructure::repository::InMemoryChatRepository,
};

use super::room_coordinator::RoomCoordinator;

pub fn conn(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub fn nick(name: &str) -> Nickname {
    Nickname::new(name.to_string()).unwrap()
}

pub fn room(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

/// InMemory の永続化と記録用 pusher を使う RoomCoordinator（生存確認は常に Dead）
pub fn build_coordinator(
    store: Arc<InMemoryChatRepository>,
    pusher: Arc<RecordingPusher>,
    clock: Arc<ManualClock>,
) -> Arc<RoomCoordinator> {
    Arc::new(RoomCoordinator::new(
        store.clone(),
        store,
        pusher,
        Arc::new(ScriptedProbe::new()),
        Duration::from_millis(50),
        clock,
    ))
}

/// 入室済みのセッションを作る
pub async fn join(
    coordinator: &RoomCoordinator,
    connection_id: &str,
    room_id: &str,
    nickname: &str,
) -> Session {
    let mut session = Session::new();
    coordinator
        .switch_room(&conn(connection_id), None, &room(room_id), &nick(nickname), None)
        .await
        .unwrap();
    session.enter(room(room_id), nick(nickname));
    session
}

/// 送信されたイベントを記録する MessagePusher
#[derive(Default)]
pub struct RecordingPusher {
    pushed: Mutex<Vec<(ConnectionId, ServerEvent)>>,
    registered: Mutex<HashSet<ConnectionId>>,
    disconnected: Mutex<Vec<ConnectionId>>,
}

impl RecordingPusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 特定の接続に届いたイベント（送信順）
    pub async fn events_for(&self, connection_id: &ConnectionId) -> Vec<ServerEvent> {
        self.pushed
            .lock()
            .await
            .iter()
            .filter(|(target, _)| target == connection_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// 特定の接続に届いたイベント名（送信順）
    pub async fn event_names_for(&self, connection_id: &ConnectionId) -> Vec<&'static str> {
        self.events_for(connection_id)
            .await
            .iter()
            .map(ServerEvent::name)
            .collect()
    }

    pub async fn disconnected(&self) -> Vec<ConnectionId> {
        self.disconnected.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.pushed.lock().await.clear();
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, connection_id: ConnectionId, _sender: PusherChannel) {
        self.registered.lock().await.insert(connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        self.registered.lock().await.remove(connection_id);
    }

    async fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.registered.lock().await.contains(connection_id)
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        self.pushed
            .lock()
            .await
            .push((connection_id.clone(), event.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        let mut pushed = self.pushed.lock().await;
        for target in targets {
            pushed.push((target, event.clone()));
        }
        Ok(())
    }

    async fn disconnect(&self, connection_id: &ConnectionId) {
        self.disconnected.lock().await.push(connection_id.clone());
        self.registered.lock().await.remove(connection_id);
    }
}

/// 生存と判定する接続を指定できる LivenessProbe（それ以外は Dead）
#[derive(Default)]
pub struct ScriptedProbe {
    alive: Mutex<HashSet<ConnectionId>>,
    probed: Mutex<Vec<ConnectionId>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_alive(&self, connection_id: &ConnectionId) {
        self.alive.lock().await.insert(connection_id.clone());
    }

    pub async fn probed(&self) -> Vec<ConnectionId> {
        self.probed.lock().await.clone()
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn probe(&self, connection_id: &ConnectionId, _timeout: Duration) -> Liveness {
        self.probed.lock().await.push(connection_id.clone());
        if self.alive.lock().await.contains(connection_id) {
            Liveness::Alive
        } else {
            Liveness::Dead
        }
    }
}
