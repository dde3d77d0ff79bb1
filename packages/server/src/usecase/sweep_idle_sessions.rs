//! UseCase: アイドルセッションの掃除

use std::{sync::Arc, time::Duration};

use crate::domain::{ChatRepository, Username};

pub struct SweepIdleSessionsUseCase {
    repository: Arc<dyn ChatRepository>,
    max_idle: Duration,
}

impl SweepIdleSessionsUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>, max_idle: Duration) -> Self {
        Self {
            repository,
            max_idle,
        }
    }

    /// `max_idle` より長くオフラインのセッションを削除する
    ///
    /// オンラインのセッションとメッセージ履歴には触れない。
    pub async fn execute(&self) -> Vec<Username> {
        let removed = self.repository.sweep_idle_sessions(self.max_idle).await;
        if removed.is_empty() {
            tracing::debug!("Idle session sweep: nothing to remove");
        } else {
            tracing::info!("Idle session sweep removed {} session(s)", removed.len());
        }
        removed
    }
}
