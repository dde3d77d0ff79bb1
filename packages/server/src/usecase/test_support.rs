//! Shared fixtures for use case tests.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{ChatRepository, ConnectionId, MessagePusher, StoreLimits},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryChatRepository,
    },
};

pub(crate) struct Fixture {
    pub repository: Arc<InMemoryChatRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryChatRepository::new(StoreLimits::default())),
            pusher: Arc::new(WebSocketMessagePusher::default()),
        }
    }

    /// Attach a transport connection and return its id and inbox
    pub async fn connect(&self, id: &str) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionId::new(id.to_string()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_connection(connection_id.clone(), tx).await;
        (connection_id, rx)
    }

    /// Attach and register `username` on a new connection
    pub async fn login(
        &self,
        id: &str,
        username: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (connection_id, rx) = self.connect(id).await;
        let username = crate::domain::Username::new(username.to_string()).unwrap();
        self.repository
            .reassociate(&username, &connection_id)
            .await
            .unwrap();
        (connection_id, rx)
    }
}

/// Everything currently queued for a connection, parsed as JSON
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        messages.push(serde_json::from_str(&raw).unwrap());
    }
    messages
}

/// Notifications with the given method
pub(crate) fn with_method<'a>(messages: &'a [Value], method: &str) -> Vec<&'a Value> {
    messages.iter().filter(|m| m["method"] == method).collect()
}
