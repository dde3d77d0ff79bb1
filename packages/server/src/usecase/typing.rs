//! UseCase: 入力中インジケーター
//!
//! 状態は持たず、`typing` / `stopTyping` を中継するだけ。

use std::sync::Arc;

use crate::{
    domain::{ChatRepository, ConnectionId, MessagePusher, Username},
    infrastructure::dto::notification::{TypingDto, method},
};

use super::{UseCaseError, presence::notification_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingKind {
    Start,
    Stop,
}

impl TypingKind {
    fn method(self) -> &'static str {
        match self {
            Self::Start => method::TYPING,
            Self::Stop => method::STOP_TYPING,
        }
    }
}

pub struct TypingUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl TypingUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// `target` があればその現在の接続にだけ送り（オフラインなら何もしない）、
    /// なければ呼び出し元以外の全接続に送る
    pub async fn execute(
        &self,
        caller: &ConnectionId,
        kind: TypingKind,
        username: String,
        target: Option<String>,
    ) -> Result<(), UseCaseError> {
        let username = Username::new(username)?;
        let json = notification_json(
            kind.method(),
            &TypingDto {
                username: username.as_str().to_string(),
            },
        )?;

        match target {
            Some(target) => {
                let target = Username::new(target)?;
                let Some(connection_id) = self.repository.resolve_connection_for(&target).await
                else {
                    tracing::debug!("Typing target '{}' is offline", target);
                    return Ok(());
                };
                if let Err(e) = self.message_pusher.send_to(&connection_id, &json).await {
                    tracing::warn!("Failed to relay typing to '{}': {}", target, e);
                }
            }
            None => {
                self.message_pusher
                    .broadcast_except(caller, &json)
                    .await
                    .map_err(|e| UseCaseError::Internal(e.to_string()))?;
            }
        }
        Ok(())
    }
}
