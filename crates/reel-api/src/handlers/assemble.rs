//! Assembly handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use reel_models::{AssemblyProgress, Clip};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for assembly.
#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    pub clips: Vec<Clip>,
}

/// Assemble the posted clips into a single MP4 and return it.
///
/// At most one assembly runs at a time; a request while one is in
/// flight gets 409.
///
/// Route: POST /api/assemble
pub async fn assemble_clips(
    State(state): State<AppState>,
    Json(request): Json<AssembleRequest>,
) -> ApiResult<Response> {
    if request.clips.is_empty() {
        return Err(ApiError::bad_request("No clips to assemble"));
    }

    info!(clips = request.clips.len(), "assembly requested");
    let job = state.assembler.begin().await?;
    let bytes = job.run(&request.clips).await?;

    let filename = format!("clips_compilation_{}.mp4", Utc::now().format("%d-%m-%Y"));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Progress of the current (or most recent) assembly run.
///
/// Route: GET /api/assemble/progress
pub async fn assembly_progress(State(state): State<AppState>) -> Json<AssemblyProgress> {
    Json(state.assembler.progress())
}
