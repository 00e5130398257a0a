//! Clip records as returned by the upstream clips API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single clip as returned by the Helix clips endpoint.
///
/// Immutable once fetched. `id` uniquely identifies a clip within one
/// aggregation result: two records carrying the same `id` are considered
/// identical, and only the first one seen is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Opaque clip identifier, globally unique upstream.
    pub id: String,
    /// Public clip page URL.
    pub url: String,
    /// Embeddable player URL.
    pub embed_url: String,
    /// Channel the clip was taken from.
    pub broadcaster_id: String,
    pub broadcaster_name: String,
    /// User who created the clip.
    pub creator_id: String,
    pub creator_name: String,
    /// Source VOD id; empty when the VOD is no longer available.
    pub video_id: String,
    pub game_id: String,
    /// Two-letter language tag (e.g. "fr").
    pub language: String,
    pub title: String,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    /// Preview image URL. Also the reference the playback slug is derived from.
    pub thumbnail_url: String,
    /// Clip length in seconds.
    pub duration: f64,
    /// Offset into the source VOD, absent when unavailable.
    pub vod_offset: Option<i64>,
}

impl Clip {
    /// Suggested filename for a single-clip download:
    /// `"{title} - {creator} - {DD-MM-YYYY HHhMM}.mp4"`.
    ///
    /// Title and creator go through [`sanitize_component`] so the result is
    /// safe for `Content-Disposition` and for common filesystems.
    pub fn download_filename(&self) -> String {
        format!(
            "{} - {} - {} {}.mp4",
            sanitize_component(&self.title),
            sanitize_component(&self.creator_name),
            self.created_at.format("%d-%m-%Y"),
            self.created_at.format("%Hh%M"),
        )
    }
}

/// Replace filesystem-hostile characters with `-`.
pub fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '-',
            other => other,
        })
        .collect()
}
