//! HTTP response shapes shared with consumers.

use serde::{Deserialize, Serialize};

use crate::Clip;

/// Response body for the clip listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipsResponse {
    /// Deduplicated clips, ranked descending by view count.
    pub clips: Vec<Clip>,
    /// Number of clips after deduplication.
    pub total: usize,
    /// Sum of view counts across `clips`.
    pub total_views: u64,
    /// Windows that still failed after retries. Zero means the listing is
    /// exhaustive for the requested period.
    pub windows_failed: usize,
}

impl ClipsResponse {
    /// Build a response from a ranked clip list.
    pub fn new(clips: Vec<Clip>, windows_failed: usize) -> Self {
        let total = clips.len();
        let total_views = clips.iter().map(|c| c.view_count).sum();
        Self {
            clips,
            total,
            total_views,
            windows_failed,
        }
    }
}
