//! エンティティと集約の読み取りビュー

use serde::{Deserialize, Serialize};

use super::{ConnectionId, MessageId, MessageText, ThreadKey, Timestamp, Username};

/// Presence record of a username.
///
/// `connection_id` always points to the most recently registered connection.
/// An offline session keeps its last connection id for reference only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: Username,
    pub connection_id: Option<ConnectionId>,
    pub last_seen_at: Timestamp,
    pub is_online: bool,
}

impl Session {
    pub fn new(username: Username, connection_id: ConnectionId, now: Timestamp) -> Self {
        Self {
            username,
            connection_id: Some(connection_id),
            last_seen_at: now,
            is_online: true,
        }
    }

    /// Whether `connection_id` is this session's current, online connection
    pub fn is_current(&self, connection_id: &ConnectionId) -> bool {
        self.is_online && self.connection_id.as_ref() == Some(connection_id)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            username: self.username.clone(),
            connection_id: self.connection_id.clone(),
            last_seen_at: self.last_seen_at,
            is_online: self.is_online,
        }
    }
}

/// Read-only snapshot of a session returned by registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub username: Username,
    pub connection_id: Option<ConnectionId>,
    pub last_seen_at: Timestamp,
    pub is_online: bool,
}

/// Result of unregistering the current connection of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedUser {
    pub username: Username,
    pub connection_id: ConnectionId,
}

/// A message in the public room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMessage {
    pub id: MessageId,
    pub user: Username,
    pub text: MessageText,
    pub timestamp: Timestamp,
}

/// A message in a private thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub id: MessageId,
    pub from: Username,
    pub to: Username,
    pub text: MessageText,
    pub timestamp: Timestamp,
}

/// Unvalidated public message record as it arrives from a client.
///
/// Both `user` and `username` are accepted; `user` wins when both are set.
#[derive(Debug, Clone, Default)]
pub struct PublicMessageDraft {
    pub id: Option<String>,
    pub user: Option<String>,
    pub username: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<i64>,
}

/// Unvalidated private message record
#[derive(Debug, Clone, Default)]
pub struct PrivateMessageDraft {
    pub from: String,
    pub to: String,
    pub text: String,
    pub timestamp: Option<i64>,
}

/// Aggregate statistics over the registry and the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageStats {
    pub public_count: usize,
    pub thread_count: usize,
    pub total_private_count: usize,
    pub online_count: usize,
    pub total_known_users: usize,
}

/// Full copy of the in-memory state, used for bulk export and import
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatSnapshot {
    pub public_messages: Vec<PublicMessage>,
    pub threads: Vec<(ThreadKey, Vec<PrivateMessage>)>,
    pub sessions: Vec<Session>,
}
