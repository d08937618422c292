//! UseCase: 保持期間を過ぎたメッセージの削除
//!
//! メッセージに付随する投票（選択肢・票）も合わせて削除される。
//! ルームのリセットとは独立して、バックグラウンドで定期的に実行する。

use std::{sync::Arc, time::Duration};

use hiroba_shared::time::Clock;
use tokio::task::JoinHandle;

use crate::domain::{MessageRepository, RepositoryError, Timestamp};

pub struct PurgeExpiredMessagesUseCase {
    message_repository: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    /// 保持期間（ミリ秒）
    retention_millis: i64,
}

impl PurgeExpiredMessagesUseCase {
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        retention_millis: i64,
    ) -> Self {
        Self {
            message_repository,
            clock,
            retention_millis,
        }
    }

    /// 保持期間より古いメッセージを削除し、削除件数を返す
    pub async fn execute(&self) -> Result<u64, RepositoryError> {
        let cutoff = Timestamp::new(self.clock.now_millis() - self.retention_millis);
        let purged = self.message_repository.delete_messages_before(cutoff).await?;
        if purged > 0 {
            tracing::info!("Retention sweep deleted {} expired messages", purged);
        }
        Ok(purged)
    }

    /// `every` ごとに削除を実行するタスクを起動
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                if let Err(e) = self.execute().await {
                    tracing::error!("Retention sweep failed: {}", e);
                }
            }
        })
    }
}
