//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! Session Registry と Conversation Store を 1 つの Mutex の内側に置き、
//! 各メソッドが両者をまとめて原子的に更新できるようにします。

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use yoriai_shared::time::{Clock, SystemClock};

use crate::domain::{
    ChatRepository, ChatSnapshot, ConnectionId, ConversationStore, PrivateMessage,
    PrivateMessageDraft, PublicMessage, PublicMessageDraft, RegistryError, RemovedUser,
    SessionRegistry, SessionView, StorageStats, StoreError, StoreLimits, Timestamp, Username,
};

/// Registry and store guarded together
#[derive(Debug, Default)]
struct ChatState {
    registry: SessionRegistry,
    store: ConversationStore,
}

/// インメモリ Chat Repository 実装
pub struct InMemoryChatRepository {
    state: Mutex<ChatState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryChatRepository {
    /// 新しい InMemoryChatRepository を作成
    pub fn new(limits: StoreLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// 時計を差し替えて作成（テスト用）
    pub fn with_clock(limits: StoreLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(ChatState {
                registry: SessionRegistry::new(),
                store: ConversationStore::with_limits(limits),
            }),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn register(
        &self,
        connection_id: &ConnectionId,
        username: &Username,
    ) -> Result<SessionView, RegistryError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.registry.register(connection_id, username, now)
    }

    async fn reassociate(
        &self,
        username: &Username,
        connection_id: &ConnectionId,
    ) -> Result<SessionView, RegistryError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.registry.reassociate(username, connection_id, now)
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Result<RemovedUser, RegistryError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.registry.unregister(connection_id, now)
    }

    async fn list_online_usernames(&self) -> Vec<Username> {
        let state = self.state.lock().await;
        state.registry.list_online_usernames().into_iter().collect()
    }

    async fn resolve_connection_for(&self, username: &Username) -> Option<ConnectionId> {
        let state = self.state.lock().await;
        state.registry.resolve_connection_for(username)
    }

    async fn username_for(&self, connection_id: &ConnectionId) -> Option<Username> {
        let state = self.state.lock().await;
        state.registry.username_for(connection_id).cloned()
    }

    async fn is_known_user(&self, username: &Username) -> bool {
        let state = self.state.lock().await;
        state.registry.is_known(username)
    }

    async fn append_public(&self, draft: PublicMessageDraft) -> Result<PublicMessage, StoreError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.store.append_public(draft, now)
    }

    async fn append_private(
        &self,
        draft: PrivateMessageDraft,
    ) -> Result<PrivateMessage, StoreError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        let ChatState { registry, store } = &mut *state;
        store.append_private(draft, registry, now)
    }

    async fn get_public(&self, limit: usize) -> Vec<PublicMessage> {
        let state = self.state.lock().await;
        state.store.get_public(limit)
    }

    async fn get_private_thread(
        &self,
        a: &Username,
        b: &Username,
        limit: usize,
    ) -> Vec<PrivateMessage> {
        let state = self.state.lock().await;
        state.store.get_private_thread(a, b, limit)
    }

    async fn get_all_threads_for(
        &self,
        username: &Username,
    ) -> BTreeMap<Username, Vec<PrivateMessage>> {
        let state = self.state.lock().await;
        state.store.get_all_threads_for(username)
    }

    async fn stats(&self) -> StorageStats {
        let state = self.state.lock().await;
        state.store.stats(&state.registry)
    }

    async fn reset_all(&self) {
        let mut state = self.state.lock().await;
        let ChatState { registry, store } = &mut *state;
        store.reset_all(registry);
    }

    async fn sweep_idle_sessions(&self, max_idle: Duration) -> Vec<Username> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.registry.sweep_idle_sessions(now, max_idle)
    }

    async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.lock().await;
        let mut threads: Vec<_> = state
            .store
            .threads()
            .map(|(key, messages)| (key.clone(), messages.iter().cloned().collect()))
            .collect();
        threads.sort_by(|a, b| a.0.cmp(&b.0));
        let mut sessions: Vec<_> = state.registry.sessions().cloned().collect();
        sessions.sort_by(|a, b| a.username.cmp(&b.username));

        ChatSnapshot {
            public_messages: state.store.get_public(usize::MAX),
            threads,
            sessions,
        }
    }

    async fn restore(&self, snapshot: ChatSnapshot) {
        let mut state = self.state.lock().await;
        state.registry.restore(snapshot.sessions);
        state
            .store
            .restore(snapshot.public_messages, snapshot.threads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Session;
    use yoriai_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryChatRepository が Registry と Store を正しく委譲すること
    // - append_private が Registry の知識（登録済みユーザー）を使うこと
    // - snapshot / restore の往復で状態が復元されること
    //
    // 【なぜこのテストが必要か】
    // - UseCase 層はこの Repository を経由してのみ状態にアクセスする
    // - Registry と Store の組み合わせ（stats, reset_all）を保証する必要がある
    // ========================================

    fn create_test_repository() -> InMemoryChatRepository {
        InMemoryChatRepository::with_clock(StoreLimits::default(), Arc::new(FixedClock::new(1000)))
    }

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_register_uses_clock() {
        // テスト項目: 登録時刻に Clock の値が使われる
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let view = repo.register(&conn("c1"), &user("alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(view.last_seen_at, Timestamp::new(1000));
        assert_eq!(repo.list_online_usernames().await, vec![user("alice")]);
    }

    #[tokio::test]
    async fn test_append_private_requires_known_users() {
        // テスト項目: 登録済みユーザー間のみプライベートメッセージを保存できる
        // given (前提条件):
        let repo = create_test_repository();
        repo.register(&conn("c1"), &user("alice")).await.unwrap();
        repo.register(&conn("c2"), &user("bob")).await.unwrap();
        let draft = |to: &str| PrivateMessageDraft {
            from: "alice".to_string(),
            to: to.to_string(),
            text: "hey".to_string(),
            timestamp: None,
        };

        // when (操作):
        let ok = repo.append_private(draft("bob")).await;
        let unknown = repo.append_private(draft("nobody")).await;

        // then (期待する結果):
        assert!(ok.is_ok());
        assert_eq!(unknown, Err(StoreError::UnknownParticipant(user("nobody"))));
        assert_eq!(repo.get_private_thread(&user("bob"), &user("alice"), 10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        // テスト項目: snapshot した内容を restore すると、セッションはオフラインで復元される
        // given (前提条件):
        let source = create_test_repository();
        source.register(&conn("c1"), &user("alice")).await.unwrap();
        source.register(&conn("c2"), &user("bob")).await.unwrap();
        source
            .append_public(PublicMessageDraft {
                user: Some("alice".to_string()),
                text: Some("hello".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        source
            .append_private(PrivateMessageDraft {
                from: "bob".to_string(),
                to: "alice".to_string(),
                text: "psst".to_string(),
                timestamp: None,
            })
            .await
            .unwrap();
        let snapshot = source.snapshot().await;

        // when (操作):
        let target = create_test_repository();
        target.restore(snapshot.clone()).await;

        // then (期待する結果):
        let stats = target.stats().await;
        assert_eq!(stats.public_count, 1);
        assert_eq!(stats.total_private_count, 1);
        assert_eq!(stats.total_known_users, 2);
        assert_eq!(stats.online_count, 0);
        let restored = target.snapshot().await;
        assert_eq!(restored.public_messages, snapshot.public_messages);
        assert_eq!(restored.threads, snapshot.threads);
        assert!(restored.sessions.iter().all(|s: &Session| !s.is_online));
    }

    #[tokio::test]
    async fn test_reset_all_clears_sessions_and_messages() {
        // テスト項目: reset_all で Registry と Store の両方が空になる
        // given (前提条件):
        let repo = create_test_repository();
        repo.register(&conn("c1"), &user("alice")).await.unwrap();
        repo.append_public(PublicMessageDraft {
            user: Some("alice".to_string()),
            text: Some("hello".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        // when (操作):
        repo.reset_all().await;

        // then (期待する結果):
        assert_eq!(repo.stats().await, StorageStats::default());
        assert_eq!(repo.username_for(&conn("c1")).await, None);
    }
}
