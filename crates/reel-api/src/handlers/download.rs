//! Clip download proxy.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;

use reel_models::sanitize_component;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query for the download proxy.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Thumbnail URL identifying the clip
    pub url: String,
    /// Filename offered to the browser
    pub filename: Option<String>,
}

/// Stream one clip through the server with an attachment disposition.
///
/// The browser cannot fetch clip media cross-origin, so it hands us the
/// clip's thumbnail URL and we resolve and proxy the signed media URL.
///
/// Route: GET /api/download?url=...&filename=...
pub async fn download_clip(
    State(state): State<AppState>,
    Query(params): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let playback_url = state.twitch.resolve_playback_url(&params.url).await?;
    let upstream = state.twitch.open_media_stream(&playback_url).await?;
    debug!(url = %params.url, "proxying clip download");

    let filename = sanitize_component(params.filename.as_deref().unwrap_or("clip.mp4"));

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        );
    if let Some(length) = upstream.content_length() {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ApiError::internal(e.to_string()))
}
