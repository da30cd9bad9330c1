//! HTTP-level tests for the collector against a mock Reddit API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use reddit_client::RedditClient;
use serde_json::{json, Value};
use subscrape_core::{CoreError, RedditApiError, RedditCredentials};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn credentials() -> RedditCredentials {
    RedditCredentials::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        "subscrape/0.1 by test_user".to_string(),
    )
}

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn post_json(id: &str, age_days: i64, author: Option<&str>) -> Value {
    let created = (reference_now() - Duration::days(age_days)).timestamp();
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "title": format!("Post {}", id),
            "selftext": "body",
            "author": author,
            "url": format!("https://example.com/{}", id),
            "created_utc": created as f64,
            "score": 10,
            "num_comments": 2,
        }
    })
}

fn listing_json(children: Vec<Value>, after: Option<&str>) -> Value {
    json!({
        "kind": "Listing",
        "data": {
            "dist": children.len(),
            "children": children,
            "after": after,
            "before": null,
        }
    })
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "*",
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> RedditClient {
    RedditClient::with_endpoints(
        credentials(),
        format!("{}/api/v1/access_token", server.uri()),
        server.uri(),
    )
}

/// Serves listing pages keyed on the `after` cursor; any cursor it does not
/// know about is a hard failure.
struct PagedListing {
    pages: Vec<(Option<&'static str>, Value)>,
}

impl Respond for PagedListing {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let after = request
            .url
            .query_pairs()
            .find(|(key, _)| *key == "after")
            .map(|(_, value)| value.to_string());

        for (cursor, body) in &self.pages {
            if after.as_deref() == *cursor {
                return ResponseTemplate::new(200).set_body_json(body.clone());
            }
        }
        ResponseTemplate::new(500)
    }
}

#[tokio::test]
async fn test_rejected_credentials_surface_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"message": "Unauthorized", "error": 401})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_top_posts("fitness", reference_now()).await;

    match result {
        Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. })) => {}
        other => panic!("expected AuthenticationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_grant_error_in_ok_body_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "unsupported_grant_type"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_top_posts("fitness", reference_now()).await;

    match result {
        Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })) => {
            assert_eq!(reason, "unsupported_grant_type");
        }
        other => panic!("expected AuthenticationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_subreddit_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/ghost/top"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_top_posts("ghost", reference_now()).await;

    match result {
        Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { subreddit })) => {
            assert_eq!(subreddit, "ghost");
        }
        other => panic!("expected SubredditNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_private_subreddit_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/walled/top"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_top_posts("walled", reference_now()).await;

    match result {
        Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { subreddit })) => {
            assert_eq!(subreddit, "walled");
        }
        other => panic!("expected SubredditNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_surfaces() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/fitness/top"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_top_posts("fitness", reference_now()).await;

    match result {
        Err(CoreError::RedditApi(RedditApiError::ServerError { status_code })) => {
            assert_eq!(status_code, 500);
        }
        other => panic!("expected ServerError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_is_reported_not_retried() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/r/fitness/top"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_top_posts("fitness", reference_now()).await;

    match result {
        Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after })) => {
            assert_eq!(retry_after, 7);
        }
        other => panic!("expected RateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_single_page_of_recent_posts_is_kept_whole() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let children: Vec<_> = (0..50)
        .map(|i| post_json(&format!("p{}", i), 30, Some("test_user")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/r/fitness/top"))
        .and(query_param("t", "all"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json(children, None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_top_posts("fitness", reference_now())
        .await
        .unwrap();

    assert_eq!(records.len(), 50);
    assert_eq!(records[0].id, "p0");
    assert_eq!(records[49].id, "p49");
    assert!(client.is_authenticated().await);
}

#[tokio::test]
async fn test_stops_requesting_once_result_limit_is_reached() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    // A full page of recent posts with more available behind the cursor.
    let children: Vec<_> = (0..100)
        .map(|i| post_json(&format!("p{}", i), 30, Some("test_user")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/r/fitness/top"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(listing_json(children, Some("t3_more"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_top_posts("fitness", reference_now())
        .await
        .unwrap();

    assert_eq!(records.len(), 100);
    assert_eq!(records[0].id, "p0");
    assert_eq!(records[99].id, "p99");
}

#[tokio::test]
async fn test_scan_stops_at_the_candidate_cap() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    // Three full pages of stale posts; a cursor to a fourth page exists but
    // must never be followed.
    let page = |prefix: &str, after: Option<&'static str>| {
        let children: Vec<_> = (0..100)
            .map(|i| post_json(&format!("{}{}", prefix, i), 200, Some("test_user")))
            .collect();
        listing_json(children, after)
    };
    Mock::given(method("GET"))
        .and(path("/r/archive/top"))
        .respond_with(PagedListing {
            pages: vec![
                (None, page("a", Some("t3_p1"))),
                (Some("t3_p1"), page("b", Some("t3_p2"))),
                (Some("t3_p2"), page("c", Some("t3_p3"))),
            ],
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_top_posts("archive", reference_now())
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_filter_spans_pages_and_preserves_rank_order() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let mut first: Vec<_> = (0..60)
        .map(|i| post_json(&format!("a{}", i), 10, Some("test_user")))
        .collect();
    first.extend((0..40).map(|i| post_json(&format!("x{}", i), 200, Some("test_user"))));
    let second: Vec<_> = (0..100)
        .map(|i| post_json(&format!("b{}", i), 20, Some("test_user")))
        .collect();

    Mock::given(method("GET"))
        .and(path("/r/fitness/top"))
        .respond_with(PagedListing {
            pages: vec![
                (None, listing_json(first, Some("t3_p1"))),
                (Some("t3_p1"), listing_json(second, Some("t3_p2"))),
            ],
        })
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_top_posts("fitness", reference_now())
        .await
        .unwrap();

    assert_eq!(records.len(), 100);
    assert_eq!(records[0].id, "a0");
    assert_eq!(records[59].id, "a59");
    assert_eq!(records[60].id, "b0");
    assert_eq!(records[99].id, "b39");
}

#[tokio::test]
async fn test_absent_author_is_reported_as_unknown() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let children = vec![
        post_json("p0", 30, Some("test_user")),
        post_json("p1", 30, None),
    ];
    Mock::given(method("GET"))
        .and(path("/r/fitness/top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json(children, None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .fetch_top_posts("fitness", reference_now())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].author, "test_user");
    assert_eq!(records[1].author, "Unknown");
    assert_eq!(records[1].title, "Post p1");
}
