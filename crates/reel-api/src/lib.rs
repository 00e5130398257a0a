//! Axum HTTP API server.
//!
//! This crate provides:
//! - Ranked clip listing over windowed Twitch aggregation
//! - A streaming download proxy for single clips
//! - Compilation assembly with progress reporting
//! - Bulk export of clips to a local directory

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ClipSettings};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, TwitchSource};
