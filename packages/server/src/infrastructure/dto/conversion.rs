//! Domain Model から DTO への変換

use crate::domain::{PrivateMessage, PublicMessage, StorageStats, Username};

use super::notification::{ChatMessageDto, OnlineUsersDto, PrivateMessageDto, StorageStatsDto};

impl From<&PublicMessage> for ChatMessageDto {
    fn from(message: &PublicMessage) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            user: message.user.as_str().to_string(),
            text: message.text.as_str().to_string(),
            timestamp: message.timestamp.value(),
        }
    }
}

impl From<&PrivateMessage> for PrivateMessageDto {
    fn from(message: &PrivateMessage) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            from: message.from.as_str().to_string(),
            to: message.to.as_str().to_string(),
            text: message.text.as_str().to_string(),
            timestamp: message.timestamp.value(),
        }
    }
}

impl From<StorageStats> for StorageStatsDto {
    fn from(stats: StorageStats) -> Self {
        Self {
            public_count: stats.public_count,
            thread_count: stats.thread_count,
            total_private_count: stats.total_private_count,
            online_count: stats.online_count,
            total_known_users: stats.total_known_users,
        }
    }
}

impl From<&[Username]> for OnlineUsersDto {
    fn from(users: &[Username]) -> Self {
        Self {
            users: users.iter().map(|u| u.as_str().to_string()).collect(),
        }
    }
}
