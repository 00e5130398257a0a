//! Application state.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use reel_media::{Assembler, ClipSource, FfmpegEngine};
use reel_models::Clip;
use reel_twitch::{Credentials, TwitchClient};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub twitch: Arc<TwitchClient>,
    pub source: Arc<dyn ClipSource>,
    pub assembler: Arc<Assembler>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let credentials = Credentials::from_env()?;
        let twitch = Arc::new(TwitchClient::new(credentials)?);
        Ok(Self::with_client(config, twitch))
    }

    /// Build state around an existing client. Used by tests that point
    /// the client at local fixtures.
    pub fn with_client(config: ApiConfig, twitch: Arc<TwitchClient>) -> Self {
        let source: Arc<dyn ClipSource> = Arc::new(TwitchSource(Arc::clone(&twitch)));
        let assembler = Assembler::new(
            config.clips.work_dir.clone(),
            Arc::clone(&source),
            Arc::new(FfmpegEngine::new()),
        )
        .with_batch_size(config.clips.download_batch);

        Self {
            config,
            twitch,
            source,
            assembler: Arc::new(assembler),
        }
    }
}

/// Adapts the Twitch client to the media crate's clip source seam.
pub struct TwitchSource(pub Arc<TwitchClient>);

#[async_trait]
impl ClipSource for TwitchSource {
    async fn fetch(&self, clip: &Clip) -> Result<Bytes, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.download_clip(&clip.thumbnail_url).await?)
    }
}
