//! UseCase: プライベートメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendPrivateMessageUseCase::execute() メソッド
//! - スレッドへの追加と、受信者・送信者への `privateMessage` 配信
//!
//! ### どのような状況を想定しているか
//! - 正常系：受信者と送信者の両方に 1 回ずつ届く
//! - 正常系：送信者が複数タブを持つ場合、呼び出し元と現在の接続の両方に届く
//! - 異常系：受信者が未登録、またはオフライン
//! - 異常系：送信者が未登録

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    domain::{
        ChatRepository, ConnectionId, MessagePusher, PrivateMessage, PrivateMessageDraft,
        StoreError, Username,
    },
    infrastructure::dto::notification::{PrivateMessageDto, method},
};

use super::{UseCaseError, presence::notification_json};

/// プライベートメッセージ送信のユースケース
pub struct SendPrivateMessageUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendPrivateMessageUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// プライベートメッセージ送信を実行
    ///
    /// 受信者がオンラインでなければ何も保存せず
    /// `UseCaseError::RecipientUnavailable` を返す。
    ///
    /// # Arguments
    ///
    /// * `caller` - リクエストを送ってきた接続
    /// * `draft` - 送信者・受信者・本文
    pub async fn execute(
        &self,
        caller: &ConnectionId,
        draft: PrivateMessageDraft,
    ) -> Result<PrivateMessage, UseCaseError> {
        Username::new(draft.from.clone())?;
        let recipient = Username::new(draft.to.clone())?;

        // 1. 受信者がオンラインであることを確認
        if self.repository.resolve_connection_for(&recipient).await.is_none() {
            return Err(UseCaseError::RecipientUnavailable(
                recipient.as_str().to_string(),
            ));
        }

        // 2. スレッドに追加
        let message = match self.repository.append_private(draft).await {
            Ok(message) => message,
            Err(StoreError::UnknownParticipant(username)) if username == recipient => {
                return Err(UseCaseError::RecipientUnavailable(
                    username.as_str().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        // 3. 受信者・呼び出し元・送信者の現在の接続に、重複なく配信
        let json = notification_json(method::PRIVATE_MESSAGE, &PrivateMessageDto::from(&message))?;
        for target in self.delivery_targets(caller, &message).await {
            if let Err(e) = self.message_pusher.send_to(&target, &json).await {
                tracing::warn!("Failed to deliver private message to '{}': {}", target, e);
            }
        }

        tracing::debug!(
            "Private message '{}' from '{}' to '{}'",
            message.id.as_str(),
            message.from,
            message.to
        );
        Ok(message)
    }

    async fn delivery_targets(
        &self,
        caller: &ConnectionId,
        message: &PrivateMessage,
    ) -> BTreeSet<ConnectionId> {
        let mut targets = BTreeSet::from([caller.clone()]);
        for username in [&message.to, &message.from] {
            if let Some(connection_id) = self.repository.resolve_connection_for(username).await {
                targets.insert(connection_id);
            }
        }
        targets
    }
}
