//! UseCase: データのエクスポート / インポート
//!
//! メッセージは codec で 1 件ずつ文字列にエンコードされる。
//! 読めないエントリはスキップし、件数を `skipped` として返す。

use std::{collections::BTreeMap, sync::Arc};

use yoriai_shared::time::{Clock, timestamp_to_rfc3339};

use crate::{
    domain::{
        ChatRepository, ChatSnapshot, MessagePusher, PrivateMessage, PublicMessage, Session,
        ThreadKey, Timestamp, Username,
    },
    infrastructure::{
        codec,
        dto::{
            http::{
                EXPORT_VERSION, ExportDocument, ExportedSession, ExportedThread, ImportSummaryDto,
            },
            notification::{DataResetDto, method},
        },
    },
};

use super::{
    UseCaseError,
    presence::{broadcast_online_users, notification_json},
};

/// エクスポートのユースケース
pub struct ExportDataUseCase {
    repository: Arc<dyn ChatRepository>,
    clock: Arc<dyn Clock>,
}

impl ExportDataUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(&self) -> ExportDocument {
        let snapshot = self.repository.snapshot().await;

        let private_threads = snapshot
            .threads
            .iter()
            .map(|(key, messages)| {
                let (a, b) = key.participants();
                ExportedThread {
                    participants: [a.as_str().to_string(), b.as_str().to_string()],
                    messages: codec::encode_many(messages),
                }
            })
            .collect();
        let sessions = snapshot
            .sessions
            .iter()
            .map(|session| ExportedSession {
                username: session.username.as_str().to_string(),
                last_seen_at: session.last_seen_at.value(),
                is_online: session.is_online,
            })
            .collect();

        ExportDocument {
            version: EXPORT_VERSION.to_string(),
            exported_at: timestamp_to_rfc3339(self.clock.now_millis()),
            public_messages: codec::encode_many(&snapshot.public_messages),
            private_threads,
            sessions,
        }
    }
}

/// インポートのユースケース
pub struct ImportDataUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ImportDataUseCase {
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

    /// 現在の状態をドキュメントの内容で置き換える
    ///
    /// インポートされたセッションは全てオフラインになる。接続中のクライアントは
    /// 再登録が必要になるため、`dataReset` を通知してから空の `onlineUsers` を通知する。
    pub async fn execute(&self, document: ExportDocument) -> Result<ImportSummaryDto, UseCaseError> {
        if !is_supported_version(&document.version) {
            return Err(UseCaseError::Validation(format!(
                "unsupported export version '{}'",
                document.version
            )));
        }
        let now = Timestamp::new(self.clock.now_millis());

        let (public_messages, mut skipped) =
            codec::decode_many::<PublicMessage>(&document.public_messages);

        let mut sessions: BTreeMap<Username, Session> = BTreeMap::new();
        for exported in document.sessions {
            match Username::new(exported.username) {
                Ok(username) => {
                    sessions.insert(
                        username.clone(),
                        Session {
                            username,
                            connection_id: None,
                            last_seen_at: Timestamp::new(exported.last_seen_at),
                            is_online: false,
                        },
                    );
                }
                Err(_) => skipped += 1,
            }
        }

        let mut threads = Vec::new();
        for exported in document.private_threads {
            let [a, b] = exported.participants;
            let (Ok(a), Ok(b)) = (Username::new(a), Username::new(b)) else {
                skipped += exported.messages.len();
                continue;
            };
            let key = ThreadKey::new(&a, &b);
            let (decoded, undecodable) = codec::decode_many::<PrivateMessage>(&exported.messages);
            skipped += undecodable;
            let (messages, foreign): (Vec<_>, Vec<_>) = decoded
                .into_iter()
                .partition(|m| ThreadKey::new(&m.from, &m.to) == key);
            skipped += foreign.len();
            if messages.is_empty() {
                continue;
            }
            for participant in [a, b] {
                sessions.entry(participant.clone()).or_insert(Session {
                    username: participant,
                    connection_id: None,
                    last_seen_at: now,
                    is_online: false,
                });
            }
            threads.push((key, messages));
        }

        let summary = ImportSummaryDto {
            public_messages: public_messages.len(),
            threads: threads.len(),
            private_messages: threads.iter().map(|(_, m)| m.len()).sum(),
            sessions: sessions.len(),
            skipped,
        };

        self.repository
            .restore(ChatSnapshot {
                public_messages,
                threads,
                sessions: sessions.into_values().collect(),
            })
            .await;
        tracing::info!(
            "Imported {} public message(s), {} thread(s), {} session(s); skipped {}",
            summary.public_messages,
            summary.threads,
            summary.sessions,
            summary.skipped
        );

        let json = notification_json(
            method::DATA_RESET,
            &DataResetDto {
                reset_at: now.value(),
            },
        )?;
        self.message_pusher
            .broadcast(&json)
            .await
            .map_err(|e| UseCaseError::Internal(e.to_string()))?;
        broadcast_online_users(self.repository.as_ref(), self.message_pusher.as_ref()).await?;
        Ok(summary)
    }
}

fn is_supported_version(version: &str) -> bool {
    version.split('.').next() == Some("1")
}
