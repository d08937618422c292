//! MessagePusher / LivenessProbe trait 定義
//!
//! 接続への送信（send-to-one, send-to-room, 切断）と、
//! ニックネーム奪還のための生存確認を抽象化します。

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, ServerEvent};

/// 接続の送信キューに積まれるフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// テキストフレーム（JSON）
    Text(String),
    /// 接続を閉じる
    Close,
}

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<OutboundFrame>;

/// 接続へのイベント送信
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の登録を解除（冪等）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 接続が登録されているか
    async fn is_registered(&self, connection_id: &ConnectionId) -> bool;

    /// 特定の接続に送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続に送信（一部の失敗は許容する）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 接続を強制的に閉じる
    async fn disconnect(&self, connection_id: &ConnectionId);
}

/// 生存確認の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Dead,
}

/// 接続の生存確認（failure detector）
///
/// タイムアウト内に肯定応答がなければ `Dead` を返す。再試行はしない。
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, connection_id: &ConnectionId, timeout: Duration) -> Liveness;
}
