//! Windowed clip aggregation over the Helix clips endpoint.
//!
//! The upstream stops returning cursors somewhere past ~1,000 results per
//! query. During prime time even one-hour windows can exceed that for a
//! broad category, burying low-view clips in the target language. The
//! aggregator therefore tiles the lookback period into small windows, fully
//! paginates each one, and merges the union.

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use reel_models::{Clip, FetchWindow};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::TwitchClient;
use crate::error::{TwitchError, TwitchResult};
use crate::retry::{retry_async, RetryConfig};

/// Helix page-size cap.
const PAGE_SIZE: u32 = 100;

/// Days to look back in addition to today.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;

/// Window width keeping per-query result counts safely under the cursor
/// ceiling even at peak traffic.
pub const DEFAULT_WINDOW_MINUTES: u32 = 30;

/// Windows fetched in parallel per batch, sized against the upstream
/// requests-per-minute ceiling.
pub const DEFAULT_BATCH_SIZE: usize = 15;

/// Parameters for one aggregation run.
#[derive(Debug, Clone)]
pub struct AggregationQuery {
    /// Upstream game/category identifier.
    pub game_id: String,
    /// Language tag a clip must carry to be kept (e.g. "fr").
    pub language: String,
    /// Days to look back from today, in addition to today.
    pub lookback_days: u32,
    /// Window width used to tile the lookback period.
    pub window_minutes: u32,
    /// Windows fetched in parallel per batch.
    pub batch_size: usize,
    /// Retry policy applied to each window before it degrades the result.
    pub retry: RetryConfig,
}

impl AggregationQuery {
    pub fn new(game_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            language: language.into(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            window_minutes: DEFAULT_WINDOW_MINUTES,
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryConfig::new("clip window fetch"),
        }
    }
}

/// Outcome of an aggregation run.
///
/// `windows_failed` counts windows that kept failing after retries; their
/// clips are missing from the result. Zero means the result is exhaustive
/// for the covered period.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Deduplicated clips, ranked descending by view count.
    pub clips: Vec<Clip>,
    pub windows_total: usize,
    pub windows_failed: usize,
}

/// One page of the paginated clips response.
#[derive(Debug, Deserialize)]
struct ClipsPage {
    data: Vec<Clip>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    cursor: Option<String>,
}

impl TwitchClient {
    /// Aggregate every clip for the query's game and language across the
    /// lookback period ending now.
    pub async fn aggregate_clips(&self, query: &AggregationQuery) -> TwitchResult<Aggregation> {
        let windows = FetchWindow::tile(Utc::now(), query.lookback_days, query.window_minutes);
        self.aggregate_windows(query, &windows).await
    }

    /// Aggregate over an explicit window list.
    ///
    /// Windows are fetched in parallel batches of `query.batch_size`,
    /// strictly sequential between batches. Each window is retried with
    /// backoff; one that still fails degrades the result (its clips are
    /// absent, `windows_failed` is bumped) instead of aborting the run.
    /// The merge deduplicates by clip id in window order, first seen wins,
    /// then ranks by view count.
    pub async fn aggregate_windows(
        &self,
        query: &AggregationQuery,
        windows: &[FetchWindow],
    ) -> TwitchResult<Aggregation> {
        let windows_total = windows.len();

        let mut per_window: Vec<TwitchResult<Vec<Clip>>> = Vec::with_capacity(windows_total);
        for batch in windows.chunks(query.batch_size.max(1)) {
            let fetches = batch.iter().map(|&window| async move {
                retry_async(&query.retry, || self.fetch_window_clips(query, window)).await
            });
            per_window.extend(join_all(fetches).await);
        }

        let mut seen = HashSet::new();
        let mut clips = Vec::new();
        let mut windows_failed = 0;
        let mut last_error = None;

        for (result, window) in per_window.into_iter().zip(windows) {
            match result {
                Ok(items) => {
                    for clip in items {
                        if seen.insert(clip.id.clone()) {
                            clips.push(clip);
                        }
                    }
                }
                Err(e) => {
                    windows_failed += 1;
                    warn!(window = %window, error = %e, "window failed after retries, degrading result");
                    last_error = Some(e);
                }
            }
        }

        if windows_total > 0 && windows_failed == windows_total {
            if let Some(last) = last_error {
                return Err(TwitchError::AllWindowsFailed {
                    windows: windows_total,
                    last: Box::new(last),
                });
            }
        }

        clips.sort_by(|a, b| b.view_count.cmp(&a.view_count));

        info!(
            clips = clips.len(),
            windows = windows_total,
            windows_failed,
            game_id = %query.game_id,
            language = %query.language,
            "aggregation complete"
        );

        Ok(Aggregation {
            clips,
            windows_total,
            windows_failed,
        })
    }

    /// Fully paginate one window, keeping clips in the query language.
    ///
    /// Follows the continuation cursor until the upstream returns none, or
    /// returns an empty page. A cursor is never retried past the page that
    /// produced it; a non-success status fails the whole window.
    async fn fetch_window_clips(
        &self,
        query: &AggregationQuery,
        window: FetchWindow,
    ) -> TwitchResult<Vec<Clip>> {
        let started_at = window.started_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let ended_at = window.ended_at.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut clips = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let token = self.access_token().await?;
            let mut request = self
                .http
                .get(format!("{}/helix/clips", self.bases.helix))
                .bearer_auth(&token)
                .header("Client-Id", &self.credentials.client_id)
                .query(&[
                    ("game_id", query.game_id.as_str()),
                    ("started_at", started_at.as_str()),
                    ("ended_at", ended_at.as_str()),
                ])
                .query(&[("first", PAGE_SIZE)]);
            if let Some(after) = cursor.as_deref() {
                request = request.query(&[("after", after)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status().as_u16();
                // A 401 means the cached token went stale mid-run; drop it
                // so the retry pass exchanges a fresh one.
                if status == 401 {
                    self.invalidate_token().await;
                }
                return Err(TwitchError::Query { status, window });
            }

            let page: ClipsPage = response.json().await?;
            let page_len = page.data.len();
            clips.extend(page.data.into_iter().filter(|c| c.language == query.language));

            cursor = page.pagination.cursor;
            if cursor.is_none() || page_len == 0 {
                break;
            }
        }

        debug!(window = %window, clips = clips.len(), "window fully paginated");
        Ok(clips)
    }
}
