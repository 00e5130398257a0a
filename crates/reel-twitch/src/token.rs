//! App access token caching for upstream authentication.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - A refresh margin so a token handed out is never about to expire
//! - Single-flight refresh to prevent a thundering herd on expiry

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::Credentials;
use crate::error::{TwitchError, TwitchResult};

/// Refresh margin subtracted from the declared TTL at store time.
///
/// Minutes rather than seconds: tokens are consumed by long batched
/// workflows, so the margin has to absorb the end-to-end latency of a whole
/// run, not just one request.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Token exchange response from the auth endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Cached token with its validity deadline (`issued_at + ttl - margin`).
struct CachedToken {
    access_token: String,
    valid_until: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.valid_until
    }
}

/// Thread-safe token cache with single-flight refresh.
///
/// The cache is an explicit object owned by its client — construction takes
/// the credentials and the auth base URL, so tests exercise it against a
/// local fake endpoint with fake credentials and no process-wide state.
pub struct TokenCache {
    http: reqwest::Client,
    credentials: Credentials,
    auth_base: String,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(
        http: reqwest::Client,
        credentials: Credentials,
        auth_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            auth_base: auth_base.into(),
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached token; the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, exchanging credentials if necessary.
    ///
    /// Fast path: return the cached token while it is before its deadline.
    /// Slow path: take the write lock, double-check (another task may have
    /// refreshed while we waited), then exchange. A failed exchange caches
    /// nothing and is not retried here — retry policy belongs to the caller.
    pub async fn get_token(&self) -> TwitchResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.exchange(&mut cache).await
    }

    /// Perform the client-credentials exchange and store the result.
    async fn exchange(&self, cache: &mut Option<CachedToken>) -> TwitchResult<String> {
        let response = self
            .http
            .post(format!("{}/oauth2/token", self.auth_base))
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::Auth {
                status: response.status().as_u16(),
            });
        }

        let token: TokenResponse = response.json().await?;
        let ttl = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);

        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            valid_until: Instant::now() + ttl,
        });

        debug!(expires_in = token.expires_in, "exchanged app access token");
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_margin_is_minutes_order() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(300));
        assert!(TOKEN_REFRESH_MARGIN >= Duration::from_secs(60));
    }

    #[test]
    fn cached_token_validity_window() {
        let valid = CachedToken {
            access_token: "t".to_string(),
            valid_until: Instant::now() + Duration::from_secs(60),
        };
        assert!(valid.is_valid());

        let stale = CachedToken {
            access_token: "t".to_string(),
            valid_until: Instant::now(),
        };
        assert!(!stale.is_valid());
    }
}
