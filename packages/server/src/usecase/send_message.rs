//! UseCase: 公開メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 公開履歴への追加と `chatMessage` の全接続へのブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者を含む全接続に配信される
//! - 正常系：`user` の代わりに `username` が指定された場合
//! - 異常系：本文が空、送信者が空

use std::sync::Arc;

use crate::{
    domain::{ChatRepository, MessagePusher, PublicMessage, PublicMessageDraft},
    infrastructure::dto::notification::{ChatMessageDto, method},
};

use super::{UseCaseError, presence::notification_json};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(PublicMessage)` - 保存されたメッセージ
    /// * `Err(UseCaseError::Validation)` - 送信者または本文が空
    pub async fn execute(&self, draft: PublicMessageDraft) -> Result<PublicMessage, UseCaseError> {
        // 1. Repository 経由で公開履歴に追加
        let message = self.repository.append_public(draft).await?;

        // 2. 送信者を含む全ての接続にブロードキャスト
        let json = notification_json(method::CHAT_MESSAGE, &ChatMessageDto::from(&message))?;
        self.message_pusher
            .broadcast(&json)
            .await
            .map_err(|e| UseCaseError::Internal(e.to_string()))?;

        tracing::debug!("Public message '{}' from '{}'", message.id.as_str(), message.user);
        Ok(message)
    }
}
