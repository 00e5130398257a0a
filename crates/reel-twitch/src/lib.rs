//! Twitch upstream client for the clipreel backend.
//!
//! This crate provides:
//! - App access token caching with a refresh margin ([`token`])
//! - Windowed clip aggregation over the Helix clips endpoint ([`aggregate`])
//! - Playback URL resolution via the public GQL persisted query and per-item
//!   media download ([`playback`])
//!
//! All upstream base URLs are constructor arguments with production
//! defaults, so tests point the client at local mock servers.

pub mod aggregate;
pub mod client;
pub mod error;
pub mod playback;
pub mod retry;
pub mod token;

// Re-export common types
pub use aggregate::{Aggregation, AggregationQuery};
pub use client::{Credentials, TwitchClient, UpstreamBases};
pub use error::{TwitchError, TwitchResult};
pub use retry::{retry_async, RetryConfig};
pub use token::TokenCache;
