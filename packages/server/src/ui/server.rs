//! Server execution logic.

use std::{future::Future, sync::Arc, time::Instant};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use yoriai_shared::time::Clock;

use crate::{
    domain::MessagePusher,
    rpc::EventSender,
    usecase::{ExportDataUseCase, GetStorageStatsUseCase},
};

use super::{
    handler::{export_data, get_stats, health_check, import_data, index, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Chat relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     events,
///     message_pusher,
///     get_storage_stats_usecase,
///     export_data_usecase,
///     clock,
/// );
/// server.run("127.0.0.1".to_string(), 5000).await?;
/// ```
pub struct Server {
    /// イベントループへの入口
    events: EventSender,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// GetStorageStatsUseCase（統計取得のユースケース）
    get_storage_stats_usecase: Arc<GetStorageStatsUseCase>,
    /// ExportDataUseCase（エクスポートのユースケース）
    export_data_usecase: Arc<ExportDataUseCase>,
    clock: Arc<dyn Clock>,
}

impl Server {
    pub fn new(
        events: EventSender,
        message_pusher: Arc<dyn MessagePusher>,
        get_storage_stats_usecase: Arc<GetStorageStatsUseCase>,
        export_data_usecase: Arc<ExportDataUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            message_pusher,
            get_storage_stats_usecase,
            export_data_usecase,
            clock,
        }
    }

    /// Build the router with all endpoints
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            events: self.events,
            message_pusher: self.message_pusher,
            get_storage_stats_usecase: self.get_storage_stats_usecase,
            export_data_usecase: self.export_data_usecase,
            clock: self.clock,
            started_at: Instant::now(),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(index))
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .route("/api/export", get(export_data))
            .route("/api/import", post(import_data))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` completes
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
