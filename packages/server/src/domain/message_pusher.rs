//! MessagePusher trait 定義（Transport Adapter）
//!
//! UseCase 層は接続（ソケット）を直接扱わず、この trait の 3 つの送信プリミティブ
//! `send_to` / `broadcast` / `broadcast_except` だけを使います。
//!
//! Delivery is best-effort and at-most-once: a connection that vanished
//! between resolution and send simply does not receive the message.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を送信先として登録
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を送信先から外す
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続に送信
    async fn send_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 全ての接続に送信
    async fn broadcast(&self, content: &str) -> Result<(), MessagePushError>;

    /// 指定した接続以外の全ての接続に送信
    async fn broadcast_except(
        &self,
        excluded: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 登録中の接続数
    async fn connection_count(&self) -> usize;
}
