//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tokio::sync::oneshot;
use yoriai_shared::time::{Clock, timestamp_to_rfc3339};

use crate::{
    infrastructure::dto::{
        http::{ExportDocument, HealthDto, ImportSummaryDto},
        notification::StorageStatsDto,
    },
    rpc::InboundEvent,
    ui::state::AppState,
    usecase::UseCaseError,
};

/// Banner
pub async fn index() -> &'static str {
    "Yoriai chat relay is running. Connect with a WebSocket to /ws."
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        timestamp: timestamp_to_rfc3339(state.clock.now_millis()),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Storage statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StorageStatsDto> {
    let stats = state.get_storage_stats_usecase.execute().await;
    Json(StorageStatsDto::from(stats))
}

/// Export everything as an encoded document
pub async fn export_data(State(state): State<Arc<AppState>>) -> Json<ExportDocument> {
    Json(state.export_data_usecase.execute().await)
}

/// Replace everything with an exported document
///
/// The import runs on the event loop so it never interleaves with a call.
/// Connected users go offline and receive `dataReset` so they re-register.
pub async fn import_data(
    State(state): State<Arc<AppState>>,
    Json(document): Json<ExportDocument>,
) -> Result<Json<ImportSummaryDto>, StatusCode> {
    let (reply, response) = oneshot::channel();
    state
        .events
        .send(InboundEvent::Import { document, reply })
        .map_err(|_| {
            tracing::error!("Event loop is gone; cannot import");
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    match response.await {
        Ok(Ok(summary)) => Ok(Json(summary)),
        Ok(Err(UseCaseError::Validation(detail))) => {
            tracing::warn!("Rejected import: {}", detail);
            Err(StatusCode::BAD_REQUEST)
        }
        Ok(Err(e)) => {
            tracing::error!("Import failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
