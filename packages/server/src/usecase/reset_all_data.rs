//! UseCase: 全データ削除

use std::sync::Arc;

use yoriai_shared::time::Clock;

use crate::{
    domain::{ChatRepository, MessagePusher, Timestamp},
    infrastructure::dto::notification::{DataResetDto, method},
};

use super::{UseCaseError, presence::notification_json};

pub struct ResetAllDataUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ResetAllDataUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// 全メッセージと全セッションを削除し、全接続に `dataReset` を通知する
    ///
    /// 接続自体は残るので、クライアントは再登録すればそのまま使い続けられる。
    pub async fn execute(&self) -> Result<Timestamp, UseCaseError> {
        self.repository.reset_all().await;
        let reset_at = Timestamp::new(self.clock.now_millis());
        tracing::warn!("All chat data has been reset");

        let json = notification_json(
            method::DATA_RESET,
            &DataResetDto {
                reset_at: reset_at.value(),
            },
        )?;
        self.message_pusher
            .broadcast(&json)
            .await
            .map_err(|e| UseCaseError::Internal(e.to_string()))?;
        Ok(reset_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::PublicMessageDraft,
        usecase::test_support::{Fixture, drain, with_method},
    };
    use yoriai_shared::time::FixedClock;

    #[tokio::test]
    async fn test_reset_all_data_clears_state_and_notifies() {
        // テスト項目: 全データが削除され、全接続に dataReset が届く
        // given (前提条件):
        let fixture = Fixture::new();
        let (_alice, mut alice_rx) = fixture.login("conn-a", "alice").await;
        fixture
            .repository
            .append_public(PublicMessageDraft {
                user: Some("alice".to_string()),
                text: Some("soon gone".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let usecase = ResetAllDataUseCase::new(
            fixture.repository.clone(),
            fixture.pusher.clone(),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        );

        // when (操作):
        let reset_at = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(reset_at.value(), 1_700_000_000_000);
        let stats = fixture.repository.stats().await;
        assert_eq!(stats.public_count, 0);
        assert_eq!(stats.total_known_users, 0);
        assert!(fixture.repository.list_online_usernames().await.is_empty());

        let messages = drain(&mut alice_rx);
        let reset = with_method(&messages, "dataReset");
        assert_eq!(reset.len(), 1);
        assert_eq!(reset[0]["params"]["resetAt"], 1_700_000_000_000_i64);
        assert_eq!(fixture.pusher.connection_count().await, 1);
    }
}
