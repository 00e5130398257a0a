//! Clip aggregation handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use reel_models::ClipsResponse;
use reel_twitch::{AggregationQuery, RetryConfig};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query overrides for clip aggregation.
#[derive(Debug, Default, Deserialize)]
pub struct ClipsQuery {
    /// Days of history to cover
    pub days: Option<u32>,
    /// Window width in minutes
    pub window_minutes: Option<u32>,
}

/// List top clips over the lookback period, ranked by view count.
///
/// Route: GET /api/clips?days=3&window_minutes=30
pub async fn get_clips(
    State(state): State<AppState>,
    Query(params): Query<ClipsQuery>,
) -> ApiResult<Json<ClipsResponse>> {
    let settings = &state.config.clips;

    let days = params.days.unwrap_or(settings.lookback_days);
    if !(1..=14).contains(&days) {
        return Err(ApiError::bad_request("days must be between 1 and 14"));
    }
    let window_minutes = params.window_minutes.unwrap_or(settings.window_minutes);
    if !(1..=1440).contains(&window_minutes) {
        return Err(ApiError::bad_request(
            "window_minutes must be between 1 and 1440",
        ));
    }

    let mut query = AggregationQuery::new(&settings.game_id, &settings.language);
    query.lookback_days = days;
    query.window_minutes = window_minutes;
    query.batch_size = settings.fetch_batch;
    query.retry = RetryConfig::new("clip window fetch").with_max_retries(settings.fetch_retries);

    let aggregation = state.twitch.aggregate_clips(&query).await?;
    info!(
        clips = aggregation.clips.len(),
        windows = aggregation.windows_total,
        windows_failed = aggregation.windows_failed,
        "clip aggregation served"
    );

    Ok(Json(ClipsResponse::new(
        aggregation.clips,
        aggregation.windows_failed,
    )))
}
