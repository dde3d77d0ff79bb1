//! UseCase: 参照系（オンラインユーザー、履歴、統計）

use std::{collections::BTreeMap, sync::Arc};

use crate::domain::{
    ChatRepository, ConnectionId, PrivateMessage, PublicMessage, StorageStats, Username,
};

/// オンラインユーザー一覧取得のユースケース
pub struct GetOnlineUsersUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl GetOnlineUsersUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> Vec<Username> {
        self.repository.list_online_usernames().await
    }
}

/// 呼び出し元に見せる履歴
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHistory {
    pub public_messages: Vec<PublicMessage>,
    /// 相手のユーザー名 → スレッド
    pub private_chats: BTreeMap<Username, Vec<PrivateMessage>>,
}

/// 履歴取得のユースケース
pub struct GetChatHistoryUseCase {
    repository: Arc<dyn ChatRepository>,
    default_public_limit: usize,
}

impl GetChatHistoryUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>, default_public_limit: usize) -> Self {
        Self {
            repository,
            default_public_limit,
        }
    }

    /// 公開履歴と、呼び出し元の接続に登録されたユーザーのスレッドを返す
    ///
    /// 未登録の接続にはプライベートスレッドを返さない。
    pub async fn execute(&self, caller: &ConnectionId, limit: Option<usize>) -> ChatHistory {
        let limit = limit.unwrap_or(self.default_public_limit);
        let public_messages = self.repository.get_public(limit).await;
        let private_chats = match self.repository.username_for(caller).await {
            Some(username) => self.repository.get_all_threads_for(&username).await,
            None => BTreeMap::new(),
        };
        ChatHistory {
            public_messages,
            private_chats,
        }
    }
}

/// 統計取得のユースケース
pub struct GetStorageStatsUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl GetStorageStatsUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> StorageStats {
        self.repository.stats().await
    }
}
