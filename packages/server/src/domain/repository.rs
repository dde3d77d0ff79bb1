//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! Each method is atomic with respect to the others: an implementation must
//! never expose a partially applied registry or store mutation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::{
    ChatSnapshot, ConnectionId, PrivateMessage, PrivateMessageDraft, PublicMessage,
    PublicMessageDraft, RegistryError, RemovedUser, SessionView, StorageStats, StoreError,
    Username,
};

/// Chat Repository trait
///
/// Session Registry と Conversation Store へのインターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// 新規登録（既に別の接続で使用中のユーザー名は拒否）
    async fn register(
        &self,
        connection_id: &ConnectionId,
        username: &Username,
    ) -> Result<SessionView, RegistryError>;

    /// 既存セッションの接続を差し替える（存在しなければ新規登録）
    async fn reassociate(
        &self,
        username: &Username,
        connection_id: &ConnectionId,
    ) -> Result<SessionView, RegistryError>;

    /// 接続の切断を反映
    async fn unregister(&self, connection_id: &ConnectionId) -> Result<RemovedUser, RegistryError>;

    /// オンラインのユーザー名一覧（重複なし、ソート済み）
    async fn list_online_usernames(&self) -> Vec<Username>;

    /// ユーザーの現在の接続
    async fn resolve_connection_for(&self, username: &Username) -> Option<ConnectionId>;

    /// 接続に登録されているユーザー名
    async fn username_for(&self, connection_id: &ConnectionId) -> Option<Username>;

    /// 一度でも登録されたことがあるか
    async fn is_known_user(&self, username: &Username) -> bool;

    async fn append_public(&self, draft: PublicMessageDraft) -> Result<PublicMessage, StoreError>;

    async fn append_private(
        &self,
        draft: PrivateMessageDraft,
    ) -> Result<PrivateMessage, StoreError>;

    async fn get_public(&self, limit: usize) -> Vec<PublicMessage>;

    async fn get_private_thread(
        &self,
        a: &Username,
        b: &Username,
        limit: usize,
    ) -> Vec<PrivateMessage>;

    async fn get_all_threads_for(&self, username: &Username) -> BTreeMap<Username, Vec<PrivateMessage>>;

    async fn stats(&self) -> StorageStats;

    /// 全メッセージと全セッションを削除
    async fn reset_all(&self);

    /// アイドル状態のオフラインセッションを削除し、削除したユーザー名を返す
    async fn sweep_idle_sessions(&self, max_idle: Duration) -> Vec<Username>;

    async fn snapshot(&self) -> ChatSnapshot;

    /// スナップショットで全状態を置き換える
    async fn restore(&self, snapshot: ChatSnapshot);
}
