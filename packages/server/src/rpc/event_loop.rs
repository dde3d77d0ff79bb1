//! Single mutation stream.
//!
//! Every call, disconnect, sweep and import is handled to completion, one at
//! a time, by one task. Connections only enqueue events.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    domain::ConnectionId,
    infrastructure::dto::http::{ExportDocument, ImportSummaryDto},
    usecase::UseCaseError,
};

use super::RpcDispatcher;

pub type ImportReply = oneshot::Sender<Result<ImportSummaryDto, UseCaseError>>;

#[derive(Debug)]
pub enum InboundEvent {
    /// Text frame received from a connection
    Call {
        connection_id: ConnectionId,
        payload: String,
    },
    /// Transport connection closed
    Disconnected { connection_id: ConnectionId },
    /// Periodic idle-session sweep
    SweepIdleSessions,
    /// Bulk import requested over HTTP
    Import {
        document: ExportDocument,
        reply: ImportReply,
    },
}

pub type EventSender = mpsc::UnboundedSender<InboundEvent>;

/// Spawn the event loop task.
///
/// The task ends once every [`EventSender`] has been dropped.
pub fn spawn_event_loop(dispatcher: Arc<RpcDispatcher>) -> (EventSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();

    let handle = tokio::spawn(async move {
        tracing::info!("Event loop started");
        while let Some(event) = rx.recv().await {
            let label = event_label(&event);
            let handled = AssertUnwindSafe(handle_event(&dispatcher, event))
                .catch_unwind()
                .await;
            if handled.is_err() {
                tracing::error!("Event loop recovered from a panic while handling {}", label);
            }
        }
        tracing::info!("Event loop stopped");
    });

    (tx, handle)
}

async fn handle_event(dispatcher: &RpcDispatcher, event: InboundEvent) {
    match event {
        InboundEvent::Call {
            connection_id,
            payload,
        } => dispatcher.handle_call(&connection_id, &payload).await,
        InboundEvent::Disconnected { connection_id } => {
            dispatcher.handle_disconnect(&connection_id).await
        }
        InboundEvent::SweepIdleSessions => {
            dispatcher.handle_sweep().await;
        }
        InboundEvent::Import { document, reply } => {
            let result = dispatcher.handle_import(document).await;
            if reply.send(result).is_err() {
                tracing::warn!("Import finished but the requester is gone");
            }
        }
    }
}

fn event_label(event: &InboundEvent) -> &'static str {
    match event {
        InboundEvent::Call { .. } => "a call",
        InboundEvent::Disconnected { .. } => "a disconnect",
        InboundEvent::SweepIdleSessions => "an idle-session sweep",
        InboundEvent::Import { .. } => "an import",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ServerConfig,
        domain::{ChatRepository, MessagePusher, StoreLimits, Username},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryChatRepository,
        },
    };
    use std::time::Duration;
    use yoriai_shared::time::SystemClock;

    #[tokio::test]
    async fn test_events_are_handled_in_order() {
        // テスト項目: キューに入れた順にイベントが処理される
        // given (前提条件):
        let repository = Arc::new(InMemoryChatRepository::new(StoreLimits::default()));
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let dispatcher = Arc::new(RpcDispatcher::new(
            repository.clone(),
            pusher.clone(),
            Arc::new(SystemClock),
            &ServerConfig::default(),
        ));
        let (events, handle) = spawn_event_loop(dispatcher);
        let connection_id = ConnectionId::new("conn-1".to_string()).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_connection(connection_id.clone(), tx).await;

        // when (操作): 登録してすぐに切断
        events
            .send(InboundEvent::Call {
                connection_id: connection_id.clone(),
                payload: r#"{"id":1,"method":"registerUser","params":{"username":"alice"}}"#
                    .to_string(),
            })
            .unwrap();
        events
            .send(InboundEvent::Disconnected {
                connection_id: connection_id.clone(),
            })
            .unwrap();
        drop(events);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        // then (期待する結果): 登録レスポンスが届き、最終的にオフライン
        let mut saw_response = false;
        while let Ok(raw) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            if value["id"] == 1 {
                assert_eq!(value["result"]["registered"], true);
                saw_response = true;
            }
        }
        assert!(saw_response);
        let alice = Username::new("alice".to_string()).unwrap();
        assert!(repository.is_known_user(&alice).await);
        assert!(repository.list_online_usernames().await.is_empty());
    }

    #[tokio::test]
    async fn test_import_event_replies_with_summary() {
        // テスト項目: Import イベントの結果が oneshot で返される
        // given (前提条件):
        let dispatcher = Arc::new(RpcDispatcher::new(
            Arc::new(InMemoryChatRepository::new(StoreLimits::default())),
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(SystemClock),
            &ServerConfig::default(),
        ));
        let (events, _handle) = spawn_event_loop(dispatcher);
        let (reply, response) = oneshot::channel();

        // when (操作):
        events
            .send(InboundEvent::Import {
                document: ExportDocument {
                    version: "1.0.0".to_string(),
                    exported_at: String::new(),
                    public_messages: Vec::new(),
                    private_threads: Vec::new(),
                    sessions: Vec::new(),
                },
                reply,
            })
            .unwrap();

        // then (期待する結果):
        let summary = response.await.unwrap().unwrap();
        assert_eq!(summary.sessions, 0);
        assert_eq!(summary.skipped, 0);
    }
}
