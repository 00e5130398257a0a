//! Bulk export handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use reel_media::ExportReport;
use reel_models::Clip;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for bulk export.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub clips: Vec<Clip>,
}

/// Download every posted clip into the export directory.
///
/// Failures are per-clip: the report lists what was saved and what was
/// not, and the request succeeds as long as the export directory is
/// usable.
///
/// Route: POST /api/export
pub async fn export_clips(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> ApiResult<Json<ExportReport>> {
    if request.clips.is_empty() {
        return Err(ApiError::bad_request("No clips to export"));
    }

    info!(clips = request.clips.len(), "bulk export requested");
    let report = reel_media::export_clips(
        state.source.as_ref(),
        &request.clips,
        &state.config.clips.export_dir,
        state.config.clips.download_batch,
    )
    .await?;

    Ok(Json(report))
}
