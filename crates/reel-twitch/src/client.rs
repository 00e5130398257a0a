//! Client construction and shared upstream plumbing.

use std::time::Duration;

use crate::error::{TwitchError, TwitchResult};
use crate::token::TokenCache;

/// Request timeout for every upstream call. Individual media downloads are
/// a few megabytes at most, so one generous transport deadline covers all
/// call shapes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Service credential pair used for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read `TWITCH_CLIENT_ID` / `TWITCH_CLIENT_SECRET` from the environment.
    pub fn from_env() -> TwitchResult<Self> {
        let client_id = std::env::var("TWITCH_CLIENT_ID")
            .map_err(|_| TwitchError::MissingCredential("TWITCH_CLIENT_ID"))?;
        let client_secret = std::env::var("TWITCH_CLIENT_SECRET")
            .map_err(|_| TwitchError::MissingCredential("TWITCH_CLIENT_SECRET"))?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

/// Base URLs of the three upstream surfaces.
///
/// Defaults point at production; tests substitute local mock servers.
#[derive(Debug, Clone)]
pub struct UpstreamBases {
    pub auth: String,
    pub helix: String,
    pub gql: String,
}

impl Default for UpstreamBases {
    fn default() -> Self {
        Self {
            auth: "https://id.twitch.tv".to_string(),
            helix: "https://api.twitch.tv".to_string(),
            gql: "https://gql.twitch.tv".to_string(),
        }
    }
}

/// Upstream client shared by the aggregation and playback paths.
///
/// Owns its token cache; there is no ambient global state, so two clients
/// with different credentials coexist in one process (and in tests).
pub struct TwitchClient {
    pub(crate) http: reqwest::Client,
    pub(crate) credentials: Credentials,
    pub(crate) bases: UpstreamBases,
    token: TokenCache,
}

impl TwitchClient {
    /// Client against the production upstream.
    pub fn new(credentials: Credentials) -> TwitchResult<Self> {
        Self::with_bases(credentials, UpstreamBases::default())
    }

    /// Client against explicit base URLs.
    pub fn with_bases(credentials: Credentials, bases: UpstreamBases) -> TwitchResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("clipreel/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let token = TokenCache::new(http.clone(), credentials.clone(), bases.auth.clone());
        Ok(Self {
            http,
            credentials,
            bases,
            token,
        })
    }

    /// A valid app access token, exchanged or served from cache.
    pub(crate) async fn access_token(&self) -> TwitchResult<String> {
        self.token.get_token().await
    }

    /// Drop the cached token after an upstream auth rejection; the next
    /// call performs a fresh exchange.
    pub(crate) async fn invalidate_token(&self) {
        self.token.invalidate().await;
    }
}
