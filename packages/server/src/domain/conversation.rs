//! Conversation Store
//!
//! Bounded, append-only logs for the public room and for each private pair.
//! Appending beyond a log's capacity evicts its oldest entries.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::{
    MessageId, MessageText, PrivateMessage, PrivateMessageDraft, PublicMessage,
    PublicMessageDraft, SessionRegistry, StorageStats, StoreError, ThreadKey, Timestamp,
    Username, ValueObjectError,
};

/// Capacity of the public room log
pub const DEFAULT_PUBLIC_CAPACITY: usize = 1000;
/// Capacity of each private thread
pub const DEFAULT_THREAD_CAPACITY: usize = 500;
/// Messages per thread returned by [`ConversationStore::get_all_threads_for`]
pub const DEFAULT_REPLAY_LIMIT: usize = 50;

/// Capacities of a [`ConversationStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub public_capacity: usize,
    pub thread_capacity: usize,
    pub replay_limit: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            public_capacity: DEFAULT_PUBLIC_CAPACITY,
            thread_capacity: DEFAULT_THREAD_CAPACITY,
            replay_limit: DEFAULT_REPLAY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    limits: StoreLimits,
    public: VecDeque<PublicMessage>,
    threads: HashMap<ThreadKey, VecDeque<PrivateMessage>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            limits,
            public: VecDeque::new(),
            threads: HashMap::new(),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Validate, normalize and append a public message.
    ///
    /// `user` and `username` are normalized to a single author field here;
    /// nothing past this point sees the alias.
    pub fn append_public(
        &mut self,
        draft: PublicMessageDraft,
        now: Timestamp,
    ) -> Result<PublicMessage, StoreError> {
        let author = draft
            .user
            .filter(|u| !u.trim().is_empty())
            .or(draft.username)
            .ok_or(ValueObjectError::Blank("user"))?;
        let user = Username::new(author)?;
        let text = MessageText::new(draft.text.unwrap_or_default())?;
        let id = match draft.id {
            Some(id) if !id.trim().is_empty() => MessageId::new(id)?,
            _ => MessageId::generate(),
        };

        let message = PublicMessage {
            id,
            user,
            text,
            timestamp: draft.timestamp.map(Timestamp::new).unwrap_or(now),
        };

        self.public.push_back(message.clone());
        if self.public.len() > self.limits.public_capacity {
            let excess = self.public.len() - self.limits.public_capacity;
            self.public.drain(..excess);
            tracing::debug!(
                "Trimmed public log to {} messages",
                self.limits.public_capacity
            );
        }

        Ok(message)
    }

    /// Validate and append a private message to the pair's thread.
    ///
    /// Both participants must be known to `registry`. The thread is created
    /// on first append.
    pub fn append_private(
        &mut self,
        draft: PrivateMessageDraft,
        registry: &SessionRegistry,
        now: Timestamp,
    ) -> Result<PrivateMessage, StoreError> {
        let from = Username::new(draft.from)?;
        let to = Username::new(draft.to)?;
        let text = MessageText::new(draft.text)?;

        for participant in [&from, &to] {
            if !registry.is_known(participant) {
                return Err(StoreError::UnknownParticipant(participant.clone()));
            }
        }

        let message = PrivateMessage {
            id: MessageId::generate(),
            from: from.clone(),
            to: to.clone(),
            text,
            timestamp: draft.timestamp.map(Timestamp::new).unwrap_or(now),
        };

        let capacity = self.limits.thread_capacity;
        let thread = self.threads.entry(ThreadKey::new(&from, &to)).or_default();
        thread.push_back(message.clone());
        if thread.len() > capacity {
            let excess = thread.len() - capacity;
            thread.drain(..excess);
        }

        Ok(message)
    }

    /// Most recent `limit` public messages, oldest first
    pub fn get_public(&self, limit: usize) -> Vec<PublicMessage> {
        tail(&self.public, limit)
    }

    /// Most recent `limit` messages between two users, oldest first.
    ///
    /// A thread that was never created yields an empty sequence.
    pub fn get_private_thread(&self, a: &Username, b: &Username, limit: usize) -> Vec<PrivateMessage> {
        self.threads
            .get(&ThreadKey::new(a, b))
            .map(|thread| tail(thread, limit))
            .unwrap_or_default()
    }

    /// Every thread `username` takes part in, keyed by the other participant,
    /// each capped to the replay limit.
    pub fn get_all_threads_for(&self, username: &Username) -> BTreeMap<Username, Vec<PrivateMessage>> {
        self.threads
            .iter()
            .filter_map(|(key, thread)| {
                let other = key.other(username)?;
                Some((other.clone(), tail(thread, self.limits.replay_limit)))
            })
            .collect()
    }

    pub fn threads(&self) -> impl Iterator<Item = (&ThreadKey, &VecDeque<PrivateMessage>)> {
        self.threads.iter()
    }

    pub fn stats(&self, registry: &SessionRegistry) -> StorageStats {
        StorageStats {
            public_count: self.public.len(),
            thread_count: self.threads.len(),
            total_private_count: self.threads.values().map(VecDeque::len).sum(),
            online_count: registry.online_count(),
            total_known_users: registry.known_count(),
        }
    }

    /// Replace the logs with imported content, applying current capacities.
    pub fn restore(
        &mut self,
        public: Vec<PublicMessage>,
        threads: impl IntoIterator<Item = (ThreadKey, Vec<PrivateMessage>)>,
    ) {
        self.public = public.into_iter().collect();
        let excess = self.public.len().saturating_sub(self.limits.public_capacity);
        self.public.drain(..excess);

        self.threads.clear();
        for (key, messages) in threads {
            let thread = self.threads.entry(key).or_default();
            thread.extend(messages);
            let excess = thread.len().saturating_sub(self.limits.thread_capacity);
            thread.drain(..excess);
        }
    }

    /// Clear every message and every session.
    pub fn reset_all(&mut self, registry: &mut SessionRegistry) {
        self.public.clear();
        self.threads.clear();
        registry.clear();
    }
}

fn tail<T: Clone>(log: &VecDeque<T>, limit: usize) -> Vec<T> {
    let skip = log.len().saturating_sub(limit);
    log.iter().skip(skip).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionId;

    fn user(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn public_draft(user: &str, text: &str) -> PublicMessageDraft {
        PublicMessageDraft {
            user: Some(user.to_string()),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn private_draft(from: &str, to: &str, text: &str) -> PrivateMessageDraft {
        PrivateMessageDraft {
            from: from.to_string(),
            to: to.to_string(),
            text: text.to_string(),
            timestamp: None,
        }
    }

    fn registry_with(names: &[&str]) -> SessionRegistry {
        let mut registry = SessionRegistry::new();
        for (i, name) in names.iter().enumerate() {
            let conn = ConnectionId::new(format!("c{i}")).unwrap();
            registry.register(&conn, &user(name), Timestamp::new(0)).unwrap();
        }
        registry
    }

    #[test]
    fn test_append_public_assigns_id_and_timestamp() {
        // テスト項目: id と timestamp が未指定の場合は採番される
        // given (前提条件):
        let mut store = ConversationStore::new();

        // when (操作):
        let message = store
            .append_public(public_draft("alice", "hi"), Timestamp::new(42))
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.user, user("alice"));
        assert_eq!(message.text.as_str(), "hi");
        assert_eq!(message.timestamp, Timestamp::new(42));
        assert!(!message.id.as_str().is_empty());
    }

    #[test]
    fn test_append_public_keeps_supplied_id_and_timestamp() {
        // テスト項目: クライアントが指定した id と timestamp は保持される
        // given (前提条件):
        let mut store = ConversationStore::new();
        let draft = PublicMessageDraft {
            id: Some("m-1".to_string()),
            timestamp: Some(7),
            ..public_draft("alice", "hi")
        };

        // when (操作):
        let message = store.append_public(draft, Timestamp::new(42)).unwrap();

        // then (期待する結果):
        assert_eq!(message.id.as_str(), "m-1");
        assert_eq!(message.timestamp, Timestamp::new(7));
    }

    #[test]
    fn test_append_public_accepts_username_alias() {
        // テスト項目: user の代わりに username フィールドを受け付ける
        // given (前提条件):
        let mut store = ConversationStore::new();
        let draft = PublicMessageDraft {
            username: Some("bob".to_string()),
            text: Some("yo".to_string()),
            ..Default::default()
        };

        // when (操作):
        let message = store.append_public(draft, Timestamp::new(0)).unwrap();

        // then (期待する結果):
        assert_eq!(message.user, user("bob"));
    }

    #[test]
    fn test_append_public_rejects_missing_fields() {
        // テスト項目: 送信者または本文が空の場合は ValidationError になる
        // given (前提条件):
        let mut store = ConversationStore::new();

        // when (操作):
        let no_user = store.append_public(
            PublicMessageDraft {
                text: Some("hi".to_string()),
                ..Default::default()
            },
            Timestamp::new(0),
        );
        let blank_text = store.append_public(public_draft("alice", "  "), Timestamp::new(0));

        // then (期待する結果):
        assert_eq!(no_user, Err(StoreError::Validation(ValueObjectError::Blank("user"))));
        assert_eq!(
            blank_text,
            Err(StoreError::Validation(ValueObjectError::Blank("text")))
        );
        assert!(store.get_public(10).is_empty());
    }

    #[test]
    fn test_public_log_evicts_oldest_beyond_capacity() {
        // テスト項目: 1001 件追加すると 1000 件が残り、最古のメッセージは取得できない
        // given (前提条件):
        let mut store = ConversationStore::new();

        // when (操作):
        for i in 0..1001 {
            store
                .append_public(public_draft("alice", &format!("msg {i}")), Timestamp::new(i))
                .unwrap();
        }

        // then (期待する結果):
        let messages = store.get_public(1000);
        assert_eq!(messages.len(), 1000);
        assert_eq!(messages[0].text.as_str(), "msg 1");
        assert_eq!(messages[999].text.as_str(), "msg 1000");
        assert!(messages.iter().all(|m| m.text.as_str() != "msg 0"));
    }

    #[test]
    fn test_get_public_returns_recent_window_oldest_first() {
        // テスト項目: 直近 limit 件を古い順に返す
        // given (前提条件):
        let mut store = ConversationStore::new();
        for i in 0..5 {
            store
                .append_public(public_draft("alice", &i.to_string()), Timestamp::new(i))
                .unwrap();
        }

        // when (操作):
        let window: Vec<_> = store
            .get_public(2)
            .into_iter()
            .map(|m| m.text.as_str().to_string())
            .collect();

        // then (期待する結果):
        assert_eq!(window, vec!["3", "4"]);
    }

    #[test]
    fn test_private_thread_is_symmetric() {
        // テスト項目: 引数の順序に関わらず同じスレッドが返される
        // given (前提条件):
        let registry = registry_with(&["alice", "bob"]);
        let mut store = ConversationStore::new();
        store
            .append_private(private_draft("alice", "bob", "hey"), &registry, Timestamp::new(1))
            .unwrap();
        store
            .append_private(private_draft("bob", "alice", "hi"), &registry, Timestamp::new(2))
            .unwrap();

        // when (操作):
        let ab = store.get_private_thread(&user("alice"), &user("bob"), 10);
        let ba = store.get_private_thread(&user("bob"), &user("alice"), 10);

        // then (期待する結果):
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 2);
        assert_eq!(ab[0].text.as_str(), "hey");
    }

    #[test]
    fn test_append_private_rejects_unknown_participant() {
        // テスト項目: 未登録ユーザー宛てのメッセージは失敗し、スレッドも作られない
        // given (前提条件):
        let registry = registry_with(&["alice"]);
        let mut store = ConversationStore::new();

        // when (操作):
        let result = store.append_private(
            private_draft("alice", "ghost", "boo"),
            &registry,
            Timestamp::new(1),
        );

        // then (期待する結果):
        assert_eq!(result, Err(StoreError::UnknownParticipant(user("ghost"))));
        assert_eq!(store.stats(&registry).thread_count, 0);
    }

    #[test]
    fn test_private_thread_evicts_oldest_beyond_capacity() {
        // テスト項目: スレッドごとの上限を超えると古いメッセージから削除される
        // given (前提条件):
        let registry = registry_with(&["alice", "bob"]);
        let mut store = ConversationStore::with_limits(StoreLimits {
            thread_capacity: 3,
            ..StoreLimits::default()
        });

        // when (操作):
        for i in 0..5 {
            store
                .append_private(
                    private_draft("alice", "bob", &i.to_string()),
                    &registry,
                    Timestamp::new(i),
                )
                .unwrap();
        }

        // then (期待する結果):
        let thread = store.get_private_thread(&user("alice"), &user("bob"), 100);
        let texts: Vec<_> = thread.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_missing_thread_is_empty() {
        // テスト項目: 存在しないスレッドの取得はエラーではなく空を返す
        // given (前提条件):
        let store = ConversationStore::new();

        // when (操作):
        let thread = store.get_private_thread(&user("x"), &user("y"), 10);

        // then (期待する結果):
        assert!(thread.is_empty());
    }

    #[test]
    fn test_get_all_threads_for_caps_replay() {
        // テスト項目: 履歴再生はスレッドごとに replay_limit 件まで、相手ユーザー名をキーに返す
        // given (前提条件):
        let registry = registry_with(&["alice", "bob", "carol"]);
        let mut store = ConversationStore::with_limits(StoreLimits {
            replay_limit: 2,
            ..StoreLimits::default()
        });
        for i in 0..4 {
            store
                .append_private(
                    private_draft("alice", "bob", &i.to_string()),
                    &registry,
                    Timestamp::new(i),
                )
                .unwrap();
        }
        store
            .append_private(private_draft("carol", "alice", "c"), &registry, Timestamp::new(9))
            .unwrap();
        store
            .append_private(private_draft("bob", "carol", "x"), &registry, Timestamp::new(9))
            .unwrap();

        // when (操作):
        let threads = store.get_all_threads_for(&user("alice"));

        // then (期待する結果):
        assert_eq!(threads.len(), 2);
        let with_bob: Vec<_> = threads[&user("bob")].iter().map(|m| m.text.as_str()).collect();
        assert_eq!(with_bob, vec!["2", "3"]);
        assert_eq!(threads[&user("carol")].len(), 1);
    }

    #[test]
    fn test_stats_and_reset_all() {
        // テスト項目: 統計値が集計され、reset_all で全データが消去される
        // given (前提条件):
        let mut registry = registry_with(&["alice", "bob"]);
        let mut store = ConversationStore::new();
        store
            .append_public(public_draft("alice", "hi"), Timestamp::new(0))
            .unwrap();
        store
            .append_private(private_draft("alice", "bob", "1"), &registry, Timestamp::new(0))
            .unwrap();
        store
            .append_private(private_draft("bob", "alice", "2"), &registry, Timestamp::new(0))
            .unwrap();

        // when (操作):
        let before = store.stats(&registry);
        store.reset_all(&mut registry);
        let after = store.stats(&registry);

        // then (期待する結果):
        assert_eq!(
            before,
            StorageStats {
                public_count: 1,
                thread_count: 1,
                total_private_count: 2,
                online_count: 2,
                total_known_users: 2,
            }
        );
        assert_eq!(after, StorageStats::default());
    }
}
