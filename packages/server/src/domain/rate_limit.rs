//! 接続ごとのメッセージ送信頻度制限（スライディングウィンドウ）
//!
//! 送信時刻のリストを保持し、試行のたびに `window` より古いものを捨てる。
//! 残りが `max` 未満なら許可して時刻を追加、`max` 以上なら拒否する。
//!
//! 状態は接続の attach で作られ detach で破棄される。接続間で共有されることはない。

use std::{collections::HashMap, collections::VecDeque, sync::Arc};

use hiroba_shared::time::Clock;
use tokio::sync::Mutex;

use super::{ConnectionId, RateLimited};

/// ウィンドウ幅と上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_millis: i64,
    pub max_messages: usize,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_millis: 3_000,
            max_messages: 5,
        }
    }
}

/// 1 接続分のスライディングウィンドウ
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    policy: RateLimitPolicy,
    sent_at: VecDeque<i64>,
}

impl SlidingWindow {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            sent_at: VecDeque::with_capacity(policy.max_messages),
        }
    }

    /// 送信を試みる。許可された場合は時刻を記録する。
    pub fn try_acquire(&mut self, now: i64) -> Result<(), RateLimited> {
        while self
            .sent_at
            .front()
            .is_some_and(|&sent| now - sent >= self.policy.window_millis)
        {
            self.sent_at.pop_front();
        }

        if self.sent_at.len() >= self.policy.max_messages {
            let oldest = self.sent_at.front().copied().unwrap_or(now);
            return Err(RateLimited {
                retry_after_millis: (oldest + self.policy.window_millis - now).max(0),
            });
        }

        self.sent_at.push_back(now);
        Ok(())
    }

    /// ウィンドウ内の送信数
    pub fn in_window(&self, now: i64) -> usize {
        self.sent_at
            .iter()
            .filter(|&&sent| now - sent < self.policy.window_millis)
            .count()
    }
}

/// 全接続分のウィンドウを管理
pub struct RateLimiter {
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<ConnectionId, SlidingWindow>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// 接続のウィンドウを作成
    pub async fn attach(&self, connection_id: &ConnectionId) {
        self.windows
            .lock()
            .await
            .insert(connection_id.clone(), SlidingWindow::new(self.policy));
    }

    /// 接続のウィンドウを破棄
    pub async fn detach(&self, connection_id: &ConnectionId) {
        self.windows.lock().await.remove(connection_id);
    }

    /// 送信を試みる
    pub async fn check(&self, connection_id: &ConnectionId) -> Result<(), RateLimited> {
        let now = self.clock.now_millis();
        let mut windows = self.windows.lock().await;
        windows
            .entry(connection_id.clone())
            .or_insert_with(|| SlidingWindow::new(self.policy))
            .try_acquire(now)
    }

    /// 追跡中の接続数
    pub async fn tracked_connections(&self) -> usize {
        self.windows.lock().await.len()
    }
}
