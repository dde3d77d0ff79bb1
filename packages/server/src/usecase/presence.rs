//! Notification helpers shared by use cases.

use serde::Serialize;

use crate::{
    domain::{ChatRepository, MessagePusher},
    infrastructure::dto::{
        notification::{OnlineUsersDto, method},
        rpc::RpcNotification,
    },
};

use super::UseCaseError;

/// Serialize a notification envelope
pub(crate) fn notification_json<T: Serialize>(
    method: &str,
    params: &T,
) -> Result<String, UseCaseError> {
    let params = serde_json::to_value(params)?;
    Ok(serde_json::to_string(&RpcNotification::new(method, params))?)
}

/// Broadcast the current `onlineUsers` list to every connection
pub(crate) async fn broadcast_online_users(
    repository: &dyn ChatRepository,
    message_pusher: &dyn MessagePusher,
) -> Result<(), UseCaseError> {
    let users = repository.list_online_usernames().await;
    let json = notification_json(method::ONLINE_USERS, &OnlineUsersDto::from(users.as_slice()))?;
    message_pusher
        .broadcast(&json)
        .await
        .map_err(|e| UseCaseError::Internal(e.to_string()))?;
    tracing::info!("Broadcasted online users: {} online", users.len());
    Ok(())
}
