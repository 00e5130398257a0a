//! Playback URL resolution and per-item media download.
//!
//! A clip's thumbnail URL encodes a stable content identifier (the slug).
//! The slug is exchanged through the public GQL persisted query for a
//! signed, time-limited playback URL, which is what actually serves bytes.

use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::client::TwitchClient;
use crate::error::{TwitchError, TwitchResult};

/// Client-Id of the public web player; the GQL endpoint only answers
/// known first-party ids.
const GQL_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

/// Persisted query hash for `VideoAccessToken_Clip`.
const VIDEO_ACCESS_TOKEN_CLIP_HASH: &str =
    "36b89d2507fce29e5ca551df756d27c1cfe079e2609642b4390aa4c35796eb11";

/// Path segment naming the current thumbnail bucket.
const THUMBNAIL_BUCKET: &str = "twitch-clips-thumbnails-prod";

/// Host of the legacy thumbnail CDN.
const LEGACY_THUMBNAIL_HOST: &str = "clips-media-assets2.twitch.tv";

/// Derive the stable clip slug from a thumbnail URL.
///
/// Two CDN layouts are recognized:
/// - current: `.../twitch-clips-thumbnails-prod/{slug}/{asset}`
/// - legacy: `https://clips-media-assets2.twitch.tv/{slug}-preview-{dims}.jpg`
///
/// Fails with [`TwitchError::SlugDerivation`] when neither shape matches —
/// never a silent default.
pub fn derive_slug(thumbnail_url: &str) -> TwitchResult<String> {
    let parsed =
        Url::parse(thumbnail_url).map_err(|_| TwitchError::slug_derivation(thumbnail_url))?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    // Current layout: the slug is the segment after the bucket name, and
    // must itself be followed by an asset segment.
    if let Some(pos) = segments.iter().position(|s| *s == THUMBNAIL_BUCKET) {
        if let (Some(slug), Some(_asset)) = (segments.get(pos + 1), segments.get(pos + 2)) {
            if !slug.is_empty() {
                return Ok((*slug).to_string());
            }
        }
    }

    // Legacy layout: host-qualified, slug runs up to the first "-preview-".
    if parsed.host_str() == Some(LEGACY_THUMBNAIL_HOST) {
        if let Some(first) = segments.first() {
            if let Some(idx) = first.find("-preview-") {
                if idx > 0 {
                    return Ok(first[..idx].to_string());
                }
            }
        }
    }

    Err(TwitchError::slug_derivation(thumbnail_url))
}

#[derive(Debug, Deserialize)]
struct GqlResponse {
    data: Option<GqlData>,
}

#[derive(Debug, Deserialize)]
struct GqlData {
    clip: Option<GqlClip>,
}

#[derive(Debug, Deserialize)]
struct GqlClip {
    #[serde(rename = "playbackAccessToken")]
    playback_access_token: Option<PlaybackAccessToken>,
    #[serde(rename = "videoQualities", default)]
    video_qualities: Vec<VideoQuality>,
}

#[derive(Debug, Deserialize)]
struct PlaybackAccessToken {
    signature: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct VideoQuality {
    quality: String,
    #[serde(rename = "sourceURL")]
    source_url: String,
}

impl TwitchClient {
    /// Resolve a clip's signed, time-limited playback URL from its
    /// thumbnail URL.
    ///
    /// The first listed quality is the highest one the upstream offers and
    /// is always used.
    pub async fn resolve_playback_url(&self, thumbnail_url: &str) -> TwitchResult<String> {
        let slug = derive_slug(thumbnail_url)?;

        let body = json!({
            "operationName": "VideoAccessToken_Clip",
            "variables": { "slug": slug },
            "extensions": {
                "persistedQuery": {
                    "version": 1,
                    "sha256Hash": VIDEO_ACCESS_TOKEN_CLIP_HASH,
                }
            }
        });

        let response = self
            .http
            .post(format!("{}/gql", self.bases.gql))
            .header("Client-ID", GQL_CLIENT_ID)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::playback(format!(
                "GQL endpoint returned status {}",
                response.status().as_u16()
            )));
        }

        let payload: GqlResponse = response.json().await?;
        let clip = payload
            .data
            .and_then(|d| d.clip)
            .ok_or_else(|| TwitchError::playback(format!("no clip in GQL payload for {slug}")))?;
        let token = clip
            .playback_access_token
            .ok_or_else(|| TwitchError::playback(format!("no playback token for {slug}")))?;
        let quality = clip
            .video_qualities
            .into_iter()
            .next()
            .ok_or_else(|| TwitchError::playback(format!("no video qualities for {slug}")))?;

        debug!(slug = %slug, quality = %quality.quality, "resolved playback URL");
        Ok(format!(
            "{}?sig={}&token={}",
            quality.source_url,
            urlencoding::encode(&token.signature),
            urlencoding::encode(&token.value)
        ))
    }

    /// Open a streaming response for an already-signed media URL.
    pub async fn open_media_stream(&self, url: &str) -> TwitchResult<reqwest::Response> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TwitchError::Download {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Download a clip's media bytes via its signed playback URL.
    pub async fn download_clip(&self, thumbnail_url: &str) -> TwitchResult<Bytes> {
        let playback_url = self.resolve_playback_url(thumbnail_url).await?;
        let response = self.open_media_stream(&playback_url).await?;
        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_slug_from_current_layout() {
        let url = "https://static-cdn.jtvnw.net/twitch-clips-thumbnails-prod/TameHeartlessEagleKappaPride-j6AtYiKiq6sCRZ3N/40f5b1cc-preview-480x272.jpg";
        assert_eq!(
            derive_slug(url).unwrap(),
            "TameHeartlessEagleKappaPride-j6AtYiKiq6sCRZ3N"
        );
    }

    #[test]
    fn derives_slug_from_legacy_layout() {
        let url = "https://clips-media-assets2.twitch.tv/AwkwardSalamander-ABC_123-preview-480x272.jpg";
        assert_eq!(derive_slug(url).unwrap(), "AwkwardSalamander-ABC_123");
    }

    #[test]
    fn legacy_slug_stops_at_first_preview_marker() {
        let url = "https://clips-media-assets2.twitch.tv/a-b-preview--preview-260x147.jpg";
        assert_eq!(derive_slug(url).unwrap(), "a-b");
    }

    #[test]
    fn unknown_shapes_fail_explicitly() {
        let err = derive_slug("https://example.com/some/other/path.jpg").unwrap_err();
        assert!(matches!(err, TwitchError::SlugDerivation { .. }));

        let err = derive_slug("not a url at all").unwrap_err();
        assert!(matches!(err, TwitchError::SlugDerivation { .. }));
    }

    #[test]
    fn current_layout_requires_asset_after_slug() {
        // Without a trailing asset segment the bucket match is ambiguous.
        let err =
            derive_slug("https://static-cdn.jtvnw.net/twitch-clips-thumbnails-prod/OnlySlug")
                .unwrap_err();
        assert!(matches!(err, TwitchError::SlugDerivation { .. }));
    }
}
