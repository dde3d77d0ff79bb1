//! Server state shared by handlers.

use std::{sync::Arc, time::Instant};

use yoriai_shared::time::Clock;

use crate::{
    domain::MessagePusher,
    rpc::EventSender,
    usecase::{ExportDataUseCase, GetStorageStatsUseCase},
};

/// Shared application state
pub struct AppState {
    /// イベントループへの入口（呼び出し・切断・インポート）
    pub events: EventSender,
    /// MessagePusher（接続の登録に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub get_storage_stats_usecase: Arc<GetStorageStatsUseCase>,
    pub export_data_usecase: Arc<ExportDataUseCase>,
    pub clock: Arc<dyn Clock>,
    pub started_at: Instant,
}
