//! Server configuration.

use std::time::Duration;

use crate::domain::StoreLimits;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
/// 6 時間ごとに掃除
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// 24 時間オフラインのセッションを削除
pub const DEFAULT_SESSION_IDLE_THRESHOLD: Duration = Duration::from_secs(24 * 60 * 60);
/// `getChatHistory` の公開履歴のデフォルト件数
pub const DEFAULT_PUBLIC_HISTORY_LIMIT: usize = 100;

/// Resolved server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub sweep_interval: Duration,
    pub session_idle_threshold: Duration,
    pub store_limits: StoreLimits,
    pub public_history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            session_idle_threshold: DEFAULT_SESSION_IDLE_THRESHOLD,
            store_limits: StoreLimits::default(),
            public_history_limit: DEFAULT_PUBLIC_HISTORY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_constants() {
        // テスト項目: デフォルト設定
        // given (前提条件):
        // when (操作):
        let config = ServerConfig::default();

        // then (期待する結果):
        assert_eq!(config.port, 5000);
        assert_eq!(config.sweep_interval, Duration::from_secs(21_600));
        assert_eq!(config.session_idle_threshold, Duration::from_secs(86_400));
        assert_eq!(config.store_limits.public_capacity, 1000);
        assert_eq!(config.store_limits.thread_capacity, 500);
        assert_eq!(config.store_limits.replay_limit, 50);
        assert_eq!(config.public_history_limit, 100);
    }
}
