//! Integration tests for `HttpFetcher` against a local wiremock server.

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redharvest_core::AppConfig;
use redharvest_scraper::{HttpFetcher, ScraperError};

fn test_config(origin: &str) -> AppConfig {
    AppConfig {
        platform_origin: origin.to_owned(),
        request_timeout_secs: 5,
        retry_backoff_base_ms: 0,
        pause_min_ms: 0,
        pause_max_ms: 0,
        ..AppConfig::default()
    }
}

fn fetcher(origin: &str, max_retries: u32) -> HttpFetcher {
    HttpFetcher::new(&test_config(origin), max_retries, 1).expect("fetcher should build")
}

#[tokio::test]
async fn sends_browser_headers_and_parses_json() {
    let server = MockServer::start().await;
    let origin = server.uri();

    Mock::given(method("GET"))
        .and(path("/r/rust.json"))
        .and(header("cache-control", "no-cache"))
        .and(header("origin", origin.as_str()))
        .and(header("referer", format!("{origin}/").as_str()))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"kind": "Listing", "data": {"children": []}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(&origin, 0)
        .fetch_json(&format!("{origin}/r/rust.json"))
        .await
        .expect("request should succeed");
    assert_eq!(body["kind"], "Listing");

    let requests = server.received_requests().await.expect("recording is on");
    let headers = &requests[0].headers;
    let value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    assert_eq!(value("accept").as_deref(), Some("application/json, text/plain, */*"));
    assert_eq!(value("accept-language").as_deref(), Some("en-US,en;q=0.9"));
}

#[tokio::test]
async fn not_found_is_returned_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(&server.uri(), 3)
        .fetch_json(&format!("{}/r/gone.json", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::NotFound { .. })),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn blocked_status_retries_on_a_fresh_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/rust.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/rust.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), 2);
    let body = fetcher
        .fetch_json(&format!("{}/r/rust.json", server.uri()))
        .await
        .expect("second attempt should succeed");
    assert_eq!(body["ok"], true);
    assert_eq!(fetcher.sessions().retired(), 1, "blocked session is retired");
}

#[tokio::test]
async fn any_server_error_retires_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/rust.json"))
        .respond_with(ResponseTemplate::new(522))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/rust.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), 1);
    let body = fetcher
        .fetch_json(&format!("{}/r/rust.json", server.uri()))
        .await
        .expect("retry after 522 should succeed");
    assert_eq!(body["ok"], true);
    assert_eq!(fetcher.sessions().retired(), 1);
}

#[tokio::test]
async fn rate_limit_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/rust.json"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let result = fetcher(&server.uri(), 2)
        .fetch_json(&format!("{}/r/rust.json", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::RateLimited { .. })),
        "expected RateLimited, got {result:?}"
    );
}

#[tokio::test]
async fn other_statuses_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(418))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(&server.uri(), 3)
        .fetch_json(&format!("{}/r/teapot.json", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 418, .. })),
        "expected UnexpectedStatus, got {result:?}"
    );
}

#[tokio::test]
async fn non_json_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(&server.uri(), 3)
        .fetch_json(&format!("{}/r/rust.json", server.uri()))
        .await;
    assert!(
        matches!(result, Err(ScraperError::Deserialize { .. })),
        "expected Deserialize, got {result:?}"
    );
}
