//! Notification and result payloads.
//!
//! Field names are camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Notification method names
pub mod method {
    pub const ONLINE_USERS: &str = "onlineUsers";
    pub const CHAT_MESSAGE: &str = "chatMessage";
    pub const PRIVATE_MESSAGE: &str = "privateMessage";
    pub const TYPING: &str = "typing";
    pub const STOP_TYPING: &str = "stopTyping";
    pub const DATA_RESET: &str = "dataReset";
}

/// Public message as delivered to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: String,
    pub user: String,
    pub text: String,
    pub timestamp: i64,
}

/// Private message as delivered to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessageDto {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    pub timestamp: i64,
}

/// `onlineUsers` notification params and `getOnlineUsers` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersDto {
    pub users: Vec<String>,
}

/// `typing` / `stopTyping` notification params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingDto {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResetDto {
    pub reset_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDto {
    pub registered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredDto {
    pub delivered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetDto {
    pub reset: bool,
}

/// `getChatHistory` result; private chats are keyed by the other participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryDto {
    pub public_messages: Vec<ChatMessageDto>,
    pub private_chats: BTreeMap<String, Vec<PrivateMessageDto>>,
}

/// `getStorageStats` result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatsDto {
    pub public_count: usize,
    pub thread_count: usize,
    pub total_private_count: usize,
    pub online_count: usize,
    pub total_known_users: usize,
}
