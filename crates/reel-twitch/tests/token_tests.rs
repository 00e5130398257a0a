//! Token cache behavior against a fake auth endpoint.

use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use reel_twitch::{Credentials, TokenCache, TwitchError};

fn cache_for(server: &MockServer) -> TokenCache {
    TokenCache::new(
        reqwest::Client::new(),
        Credentials::new("test-client-id", "test-client-secret"),
        server.uri(),
    )
}

#[tokio::test]
async fn token_is_reused_within_its_validity_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=test-client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-alpha",
            "expires_in": 5000,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let first = cache.get_token().await.unwrap();
    let second = cache.get_token().await.unwrap();

    assert_eq!(first, "tok-alpha");
    assert_eq!(first, second);
    // The mock's expect(1) verifies no second exchange happened.
}

/// Hands out a fresh token per exchange so refreshes are observable.
struct CountingTokens {
    calls: AtomicU32,
    expires_in: u64,
}

impl Respond for CountingTokens {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": format!("tok-{n}"),
            "expires_in": self.expires_in,
            "token_type": "bearer"
        }))
    }
}

#[tokio::test]
async fn token_within_margin_of_expiry_is_exchanged_again() {
    let server = MockServer::start().await;
    // A declared TTL at the refresh margin leaves no usable validity window,
    // so every call must exchange.
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(CountingTokens {
            calls: AtomicU32::new(0),
            expires_in: 300,
        })
        .expect(2)
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    let first = cache.get_token().await.unwrap();
    let second = cache.get_token().await.unwrap();

    assert_eq!(first, "tok-0");
    assert_eq!(second, "tok-1");
}

#[tokio::test]
async fn invalidate_forces_a_fresh_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(CountingTokens {
            calls: AtomicU32::new(0),
            expires_in: 5000,
        })
        .expect(2)
        .mount(&server)
        .await;

    let cache = cache_for(&server);
    assert_eq!(cache.get_token().await.unwrap(), "tok-0");
    cache.invalidate().await;
    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
}

/// Fails the first exchange, succeeds afterwards.
struct FailThenSucceed {
    calls: AtomicU32,
}

impl Respond for FailThenSucceed {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            ResponseTemplate::new(403).set_body_json(json!({
                "status": 403,
                "message": "invalid client secret"
            }))
        } else {
            ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-after-failure",
                "expires_in": 5000,
                "token_type": "bearer"
            }))
        }
    }
}

#[tokio::test]
async fn failed_exchange_caches_nothing_and_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(FailThenSucceed {
            calls: AtomicU32::new(0),
        })
        .mount(&server)
        .await;

    let cache = cache_for(&server);

    let err = cache.get_token().await.unwrap_err();
    assert!(matches!(err, TwitchError::Auth { status: 403 }));

    // Nothing was cached, so the next call performs a fresh exchange.
    assert_eq!(cache.get_token().await.unwrap(), "tok-after-failure");
}

#[tokio::test]
async fn concurrent_first_calls_share_one_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(CountingTokens {
            calls: AtomicU32::new(0),
            expires_in: 5000,
        })
        .expect(1)
        .mount(&server)
        .await;

    let cache = std::sync::Arc::new(cache_for(&server));
    let a = tokio::spawn({
        let cache = cache.clone();
        async move { cache.get_token().await.unwrap() }
    });
    let b = tokio::spawn({
        let cache = cache.clone();
        async move { cache.get_token().await.unwrap() }
    });

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(a, "tok-0");
    assert_eq!(a, b);
}
