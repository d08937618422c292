//! WebSocket を使った MessagePusher / LivenessProbe 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を管理
//! - クライアントへのイベント送信（push_to, broadcast）と強制切断（disconnect）
//! - 生存確認（`server_ping` を送り、同じ ackId の `"ok"` 応答を待つ）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 生存確認の応答は UI 層が受信した ack フレームを `settle_probe` に渡すことで解決されます。

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};
use uuid::Uuid;

use crate::{
    domain::{
        ConnectionId, Liveness, LivenessProbe, MessagePushError, MessagePusher, OutboundFrame,
        PusherChannel, ServerEvent,
    },
    infrastructure::dto::websocket::{PROBE_REPLY, encode_event, encode_probe},
};

/// WebSocket を使った MessagePusher 実装
///
/// ## フィールド
///
/// - `clients`: 接続中のクライアントと対応する送信チャンネルのマップ
/// - `pending_probes`: 応答待ちの生存確認（ackId → 応答の受け口）
#[derive(Default)]
pub struct WebSocketMessagePusher {
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
    pending_probes: Mutex<HashMap<String, oneshot::Sender<String>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生存確認への応答を受け取る
    ///
    /// 対応する生存確認が無ければ false（タイムアウト済み、または無関係な ack）。
    pub async fn settle_probe(&self, ack_id: &str, reply: String) -> bool {
        match self.pending_probes.lock().await.remove(ack_id) {
            Some(waiter) => waiter.send(reply).is_ok(),
            None => false,
        }
    }

    async fn send_frame(
        &self,
        connection_id: &ConnectionId,
        frame: OutboundFrame,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        tracing::debug!("Client '{}' registered to MessagePusher", connection_id);
        self.clients.lock().await.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        self.clients.lock().await.remove(connection_id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", connection_id);
    }

    async fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.clients.lock().await.contains_key(connection_id)
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        let frame = encode_event(event)?;
        self.send_frame(connection_id, OutboundFrame::Text(frame))
            .await?;
        tracing::debug!("Pushed '{}' to client '{}'", event.name(), connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        let frame = encode_event(event)?;
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(OutboundFrame::Text(frame.clone())) {
                        tracing::warn!("Failed to push '{}' to '{}': {}", event.name(), target, e);
                    }
                }
                None => {
                    tracing::warn!(
                        "Client '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }

    async fn disconnect(&self, connection_id: &ConnectionId) {
        if let Some(sender) = self.clients.lock().await.remove(connection_id) {
            // 受信側が既に閉じていれば何もしない
            let _ = sender.send(OutboundFrame::Close);
            tracing::info!("Client '{}' disconnected by server", connection_id);
        }
    }
}

#[async_trait]
impl LivenessProbe for WebSocketMessagePusher {
    async fn probe(&self, connection_id: &ConnectionId, timeout: Duration) -> Liveness {
        let ack_id = Uuid::new_v4().to_string();
        let (waiter, reply) = oneshot::channel();
        self.pending_probes
            .lock()
            .await
            .insert(ack_id.clone(), waiter);

        let sent = match encode_probe(&ack_id) {
            Ok(frame) => self
                .send_frame(connection_id, OutboundFrame::Text(frame))
                .await
                .is_ok(),
            Err(_) => false,
        };

        let liveness = if sent {
            match tokio::time::timeout(timeout, reply).await {
                Ok(Ok(answer)) if answer == PROBE_REPLY => Liveness::Alive,
                _ => Liveness::Dead,
            }
        } else {
            Liveness::Dead
        };

        self.pending_probes.lock().await.remove(&ack_id);
        tracing::debug!("Probed '{}': {:?}", connection_id, liveness);
        liveness
    }
}
