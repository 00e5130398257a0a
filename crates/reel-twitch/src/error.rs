//! Error types for upstream Twitch operations.

use reel_models::FetchWindow;
use thiserror::Error;

/// Errors raised while talking to the upstream service.
#[derive(Error, Debug)]
pub enum TwitchError {
    /// Credential exchange against the auth endpoint failed.
    #[error("credential exchange failed with upstream status {status}")]
    Auth { status: u16 },

    /// A paginated clip query returned a non-success status.
    #[error("clip query for window {window} failed with status {status}")]
    Query { status: u16, window: FetchWindow },

    /// Every window of an aggregation failed, so there is no result to
    /// degrade to.
    #[error("all {windows} aggregation windows failed; last error: {last}")]
    AllWindowsFailed {
        windows: usize,
        #[source]
        last: Box<TwitchError>,
    },

    /// Neither known thumbnail URL shape matched.
    #[error("could not derive a clip slug from thumbnail URL {url}")]
    SlugDerivation { url: String },

    /// The GQL playback exchange returned an unusable payload.
    #[error("playback token exchange failed: {message}")]
    Playback { message: String },

    /// A per-item media fetch failed.
    #[error("clip download from {url} failed with status {status}")]
    Download { status: u16, url: String },

    /// Transport-level failure talking to upstream.
    #[error("upstream transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A required credential is missing from the environment.
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

impl TwitchError {
    /// Create a playback error with a descriptive message.
    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }

    /// Create a slug derivation error for the given URL.
    pub fn slug_derivation(url: impl Into<String>) -> Self {
        Self::SlugDerivation { url: url.into() }
    }
}

/// Result type for upstream operations.
pub type TwitchResult<T> = Result<T, TwitchError>;
