//! Windowed aggregation against a fake Helix upstream.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use reel_models::FetchWindow;
use reel_twitch::{AggregationQuery, Credentials, RetryConfig, TwitchClient, TwitchError, UpstreamBases};

fn client_for(server: &MockServer) -> TwitchClient {
    TwitchClient::with_bases(
        Credentials::new("test-client-id", "test-client-secret"),
        UpstreamBases {
            auth: server.uri(),
            helix: server.uri(),
            gql: server.uri(),
        },
    )
    .unwrap()
}

fn fast_query() -> AggregationQuery {
    let mut query = AggregationQuery::new("21779", "fr");
    query.retry = RetryConfig::new("clip window fetch")
        .with_max_retries(1)
        .with_base_delay(std::time::Duration::from_millis(1));
    query
}

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn win(start: &str, end: &str) -> FetchWindow {
    FetchWindow {
        started_at: ts(start),
        ended_at: ts(end),
    }
}

fn clip_json(id: &str, views: u64, language: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("https://clips.twitch.tv/{id}"),
        "embed_url": format!("https://clips.twitch.tv/embed?clip={id}"),
        "broadcaster_id": "1",
        "broadcaster_name": "chan",
        "creator_id": "2",
        "creator_name": "author",
        "video_id": "",
        "game_id": "21779",
        "language": language,
        "title": format!("clip {id}"),
        "view_count": views,
        "created_at": created_at,
        "thumbnail_url": format!("https://clips-media-assets2.twitch.tv/{id}-preview-480x272.jpg"),
        "duration": 30.0,
        "vod_offset": null
    })
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": 5000,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Serves the fixture clips whose `created_at` falls inside the requested
/// window. Boundaries are inclusive on both ends, like the upstream, which
/// is exactly what makes adjacent windows return boundary duplicates.
struct WindowedClips {
    clips: Vec<serde_json::Value>,
}

impl Respond for WindowedClips {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut started = None;
        let mut ended = None;
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "started_at" => started = Some(ts(&value)),
                "ended_at" => ended = Some(ts(&value)),
                _ => {}
            }
        }
        let (started, ended) = (started.unwrap(), ended.unwrap());

        let data: Vec<_> = self
            .clips
            .iter()
            .filter(|c| {
                let at = ts(c["created_at"].as_str().unwrap());
                started <= at && at <= ended
            })
            .cloned()
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "data": data,
            "pagination": {}
        }))
    }
}

#[tokio::test]
async fn paginates_until_cursor_absent_and_filters_language() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    // Continuation page first so it wins when `after` is present.
    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .and(query_param("after", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [clip_json("fr3", 100, "fr", "2024-03-10T00:20:00Z")],
            "pagination": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .and(query_param("game_id", "21779"))
        .and(query_param("first", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                clip_json("fr1", 50, "fr", "2024-03-10T00:05:00Z"),
                clip_json("en1", 999, "en", "2024-03-10T00:10:00Z"),
                clip_json("fr2", 10, "fr", "2024-03-10T00:15:00Z"),
            ],
            "pagination": { "cursor": "c1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let windows = [win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z")];
    let aggregation = client
        .aggregate_windows(&fast_query(), &windows)
        .await
        .unwrap();

    let ids: Vec<_> = aggregation.clips.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["fr3", "fr1", "fr2"], "ranked by views, language filtered");
    assert_eq!(aggregation.windows_total, 1);
    assert_eq!(aggregation.windows_failed, 0);
}

#[tokio::test]
async fn empty_page_terminates_pagination_even_with_cursor() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pagination": { "cursor": "would-loop-forever" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let windows = [win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z")];
    let aggregation = client
        .aggregate_windows(&fast_query(), &windows)
        .await
        .unwrap();

    assert!(aggregation.clips.is_empty());
}

#[tokio::test]
async fn boundary_duplicates_collapse_to_two_records() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    // `a` sits exactly on the boundary between the two windows, so the
    // upstream returns it for both; `b` is inside the second window.
    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(WindowedClips {
            clips: vec![
                clip_json("a", 5, "fr", "2024-03-10T00:30:00Z"),
                clip_json("b", 10, "fr", "2024-03-10T00:45:00Z"),
            ],
        })
        .mount(&server)
        .await;

    let client = client_for(&server);
    let windows = [
        win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z"),
        win("2024-03-10T00:30:00Z", "2024-03-10T01:00:00Z"),
    ];
    let aggregation = client
        .aggregate_windows(&fast_query(), &windows)
        .await
        .unwrap();

    let ids: Vec<_> = aggregation.clips.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["b", "a"], "exactly two records, ranked by views");
}

#[tokio::test]
async fn dedup_is_idempotent_across_window_sizes() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(WindowedClips {
            clips: vec![
                clip_json("c10", 5, "fr", "2024-03-10T00:10:00Z"),
                clip_json("c30", 7, "fr", "2024-03-10T00:30:00Z"),
                clip_json("c45", 9, "fr", "2024-03-10T00:45:00Z"),
            ],
        })
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = fast_query();

    let whole = [win("2024-03-10T00:00:00Z", "2024-03-10T01:00:00Z")];
    let halves = [
        win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z"),
        win("2024-03-10T00:30:00Z", "2024-03-10T01:00:00Z"),
    ];

    let coarse = client.aggregate_windows(&query, &whole).await.unwrap();
    let fine = client.aggregate_windows(&query, &halves).await.unwrap();

    let coarse_ids: Vec<_> = coarse.clips.iter().map(|c| c.id.clone()).collect();
    let fine_ids: Vec<_> = fine.clips.iter().map(|c| c.id.clone()).collect();
    assert_eq!(coarse_ids, fine_ids);
}

/// Fails requests for one window's start instant, counting the attempts.
struct FailingWindow {
    bad_start: DateTime<Utc>,
    bad_calls: AtomicU32,
    clips: Vec<serde_json::Value>,
}

impl Respond for FailingWindow {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let started = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "started_at")
            .map(|(_, v)| ts(&v))
            .unwrap();

        if started == self.bad_start {
            self.bad_calls.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200).set_body_json(json!({
                "data": self.clips,
                "pagination": {}
            }))
        }
    }
}

#[tokio::test]
async fn failed_window_is_retried_then_degrades_the_result() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(FailingWindow {
            bad_start: ts("2024-03-10T00:30:00Z"),
            bad_calls: AtomicU32::new(0),
            clips: vec![clip_json("good", 42, "fr", "2024-03-10T00:10:00Z")],
        })
        .mount(&server)
        .await;

    let client = client_for(&server);
    let windows = [
        win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z"),
        win("2024-03-10T00:30:00Z", "2024-03-10T01:00:00Z"),
    ];
    let aggregation = client
        .aggregate_windows(&fast_query(), &windows)
        .await
        .unwrap();

    assert_eq!(aggregation.windows_total, 2);
    assert_eq!(aggregation.windows_failed, 1);
    let ids: Vec<_> = aggregation.clips.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["good"], "surviving window still contributes");

    // One initial attempt plus one retry hit the failing window.
    let requests = server.received_requests().await.unwrap();
    let bad_hits = requests
        .iter()
        .filter(|r| r.url.path() == "/helix/clips")
        .filter(|r| {
            r.url
                .query_pairs()
                .any(|(k, v)| k == "started_at" && ts(&v) == ts("2024-03-10T00:30:00Z"))
        })
        .count();
    assert_eq!(bad_hits, 2);
}

#[tokio::test]
async fn stale_token_is_reexchanged_after_auth_rejection() {
    let server = MockServer::start().await;

    // One exchange up front, a second one after the 401 below.
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": 5000,
            "token_type": "bearer"
        })))
        .expect(2)
        .mount(&server)
        .await;

    // First clips request is rejected as unauthorized, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [clip_json("ok", 3, "fr", "2024-03-10T00:10:00Z")],
            "pagination": {}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let windows = [win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z")];
    let aggregation = client
        .aggregate_windows(&fast_query(), &windows)
        .await
        .unwrap();

    assert_eq!(aggregation.windows_failed, 0);
    let ids: Vec<_> = aggregation.clips.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["ok"]);
}

#[tokio::test]
async fn aggregation_fails_only_when_every_window_fails() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/helix/clips"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let windows = [
        win("2024-03-10T00:00:00Z", "2024-03-10T00:30:00Z"),
        win("2024-03-10T00:30:00Z", "2024-03-10T01:00:00Z"),
    ];
    let err = client
        .aggregate_windows(&fast_query(), &windows)
        .await
        .unwrap_err();

    match err {
        TwitchError::AllWindowsFailed { windows, last } => {
            assert_eq!(windows, 2);
            assert!(matches!(*last, TwitchError::Query { status: 502, .. }));
        }
        other => panic!("expected AllWindowsFailed, got {other}"),
    }
}
