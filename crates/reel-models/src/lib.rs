//! Shared data models for the clipreel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Clip records as returned by the upstream clips API
//! - Fetch-window tiling over a multi-day lookback period
//! - Assembly phase and progress reporting
//! - HTTP response shapes shared with consumers

pub mod api;
pub mod clip;
pub mod progress;
pub mod window;

// Re-export common types
pub use api::ClipsResponse;
pub use clip::{sanitize_component, Clip};
pub use progress::{AssemblyPhase, AssemblyProgress};
pub use window::FetchWindow;
