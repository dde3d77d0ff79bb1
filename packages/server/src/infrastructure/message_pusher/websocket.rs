//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのメッセージ送信（send_to, broadcast, broadcast_except）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! 送信は best-effort です。送信先の接続が既に閉じている場合、
//! そのメッセージは破棄され、ログに記録されるだけです。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::default();
/// pusher.register_connection(connection_id.clone(), tx).await;
/// pusher.send_to(&connection_id, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    connections: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(connections: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        connections.insert(connection_id, sender);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn send_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        let Some(sender) = connections.get(connection_id) else {
            return Err(MessagePushError::ConnectionNotFound(
                connection_id.to_string(),
            ));
        };
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(&self, content: &str) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;
        push_all(connections.iter(), content);
        Ok(())
    }

    async fn broadcast_except(
        &self,
        excluded: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;
        push_all(
            connections.iter().filter(|(id, _)| *id != excluded),
            content,
        );
        Ok(())
    }

    async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}

/// ブロードキャストでは一部の送信失敗を許容
fn push_all<'a>(
    targets: impl Iterator<Item = (&'a ConnectionId, &'a PusherChannel)>,
    content: &str,
) {
    for (connection_id, sender) in targets {
        if let Err(e) = sender.send(content.to_string()) {
            tracing::warn!(
                "Failed to push message to connection '{}': {}",
                connection_id,
                e
            );
        } else {
            tracing::debug!("Broadcasted message to connection '{}'", connection_id);
        }
    }
}
