//! UseCase: ユーザー登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RegisterUserUseCase::execute() メソッド
//! - 登録後の `onlineUsers` ブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規登録、同じユーザー名での再接続（別タブ）
//! - 異常系：空のユーザー名、排他登録での重複

use std::sync::Arc;

use crate::domain::{ChatRepository, ConnectionId, MessagePusher, SessionView, Username};

use super::{UseCaseError, presence::broadcast_online_users};

/// 登録方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationMode {
    /// 既存セッションがあれば接続を差し替える（再接続・複数タブ）
    #[default]
    Reassociate,
    /// オンラインのユーザー名は拒否する
    Exclusive,
}

impl RegistrationMode {
    pub fn from_exclusive(exclusive: bool) -> Self {
        if exclusive {
            Self::Exclusive
        } else {
            Self::Reassociate
        }
    }
}

/// ユーザー登録のユースケース
pub struct RegisterUserUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RegisterUserUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 接続にユーザー名を紐付け、全接続に `onlineUsers` を通知する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        username: String,
        mode: RegistrationMode,
    ) -> Result<SessionView, UseCaseError> {
        let username = Username::new(username)?;

        let session = match mode {
            RegistrationMode::Reassociate => {
                self.repository.reassociate(&username, connection_id).await?
            }
            RegistrationMode::Exclusive => {
                self.repository.register(connection_id, &username).await?
            }
        };
        tracing::info!(
            "User '{}' registered on connection '{}'",
            username,
            connection_id
        );

        broadcast_online_users(self.repository.as_ref(), self.message_pusher.as_ref()).await?;
        Ok(session)
    }
}
