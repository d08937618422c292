//! サーバー設定
//!
//! バイナリの CLI 引数（clap）から組み立てられ、UseCase の生成に使われる。

use std::time::Duration;

use crate::domain::RateLimitPolicy;

/// 1 日（ミリ秒）
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// 送信頻度制限
    pub rate_limit: RateLimitPolicy,
    /// 入室時に送る履歴の件数
    pub history_limit: usize,
    /// ニックネーム奪還時の生存確認タイムアウト
    pub probe_timeout: Duration,
    /// メッセージ保持日数
    pub retention_days: u32,
    /// 古いメッセージを削除する間隔
    pub sweep_interval: Duration,
}

impl ChatConfig {
    /// 保持期間（ミリ秒）
    pub fn retention_millis(&self) -> i64 {
        i64::from(self.retention_days) * DAY_MILLIS
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitPolicy::default(),
            history_limit: 20,
            probe_timeout: Duration::from_millis(2_000),
            retention_days: 1,
            sweep_interval: Duration::from_secs(60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        // テスト項目: 既定値（3 秒に 5 件、履歴 20 件、2 秒の生存確認、1 日保持）
        // given (前提条件):
        let config = ChatConfig::default();

        // when (操作):
        let retention = config.retention_millis();

        // then (期待する結果):
        assert_eq!(config.rate_limit.window_millis, 3_000);
        assert_eq!(config.rate_limit.max_messages, 5);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(retention, 86_400_000);
    }
}
