//! UseCase: 接続切断処理

use std::sync::Arc;

use crate::domain::{ChatRepository, ConnectionId, MessagePusher, RemovedUser};

use super::{UseCaseError, presence::broadcast_online_users};

/// 接続切断のユースケース
pub struct DisconnectConnectionUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectConnectionUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 切断を反映する
    ///
    /// 接続がユーザーの現在の接続だった場合のみユーザーはオフラインになり、
    /// `onlineUsers` がブロードキャストされる。古い接続（別タブに差し替え済み）の
    /// 切断では何も変わらず `Ok(None)` を返す。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<RemovedUser>, UseCaseError> {
        self.message_pusher.unregister_connection(connection_id).await;

        let removed = match self.repository.unregister(connection_id).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::debug!("Ignoring disconnect of '{}': {}", connection_id, e);
                return Ok(None);
            }
        };
        tracing::info!(
            "User '{}' went offline (connection '{}')",
            removed.username,
            removed.connection_id
        );

        broadcast_online_users(self.repository.as_ref(), self.message_pusher.as_ref()).await?;
        Ok(Some(removed))
    }
}
