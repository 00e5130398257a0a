//! API configuration.

use std::path::PathBuf;

use reel_media::DEFAULT_DOWNLOAD_BATCH;
use reel_twitch::aggregate::{DEFAULT_BATCH_SIZE, DEFAULT_LOOKBACK_DAYS, DEFAULT_WINDOW_MINUTES};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Clip aggregation and assembly settings
    pub clips: ClipSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            clips: ClipSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            clips: ClipSettings::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Settings for clip aggregation, assembly, and export.
#[derive(Debug, Clone)]
pub struct ClipSettings {
    /// Twitch game/category id to aggregate
    pub game_id: String,
    /// Clip language filter
    pub language: String,
    /// Days of history to cover
    pub lookback_days: u32,
    /// Window width in minutes
    pub window_minutes: u32,
    /// Windows fetched concurrently per batch
    pub fetch_batch: usize,
    /// Retries per failed window fetch
    pub fetch_retries: u32,
    /// Clips downloaded concurrently per batch
    pub download_batch: usize,
    /// Root directory for assembly job workspaces
    pub work_dir: PathBuf,
    /// Directory bulk exports are written to
    pub export_dir: PathBuf,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            // League of Legends
            game_id: "21779".to_string(),
            language: "fr".to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            window_minutes: DEFAULT_WINDOW_MINUTES,
            fetch_batch: DEFAULT_BATCH_SIZE,
            fetch_retries: 2,
            download_batch: DEFAULT_DOWNLOAD_BATCH,
            work_dir: std::env::temp_dir().join("clipreel"),
            export_dir: PathBuf::from("exports"),
        }
    }
}

impl ClipSettings {
    /// Create settings from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            game_id: std::env::var("REEL_GAME_ID").unwrap_or(defaults.game_id),
            language: std::env::var("REEL_LANGUAGE").unwrap_or(defaults.language),
            lookback_days: std::env::var("REEL_LOOKBACK_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.lookback_days),
            window_minutes: std::env::var("REEL_WINDOW_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.window_minutes),
            fetch_batch: std::env::var("REEL_FETCH_BATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fetch_batch),
            fetch_retries: std::env::var("REEL_FETCH_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fetch_retries),
            download_batch: std::env::var("REEL_DOWNLOAD_BATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.download_batch),
            work_dir: std::env::var("REEL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            export_dir: std::env::var("REEL_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
        }
    }
}
