//! PageFetcher retry and identity fallback over HTTP

use thread_harvest::config::FetchConfig;
use thread_harvest::crawler::{BackoffPolicy, PageFetcher};
use thread_harvest::FetchError;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fetcher that never sleeps between attempts
fn fetcher(retries_per_identity: u32) -> PageFetcher {
    let config = FetchConfig {
        timeout_secs: 5,
        retries_per_identity,
        ..FetchConfig::default()
    };
    PageFetcher::new(&config)
        .expect("Failed to build fetcher")
        .with_backoff(BackoffPolicy::none())
}

fn page_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/topic--1?p=1", server.uri())).expect("Failed to parse page URL")
}

#[tokio::test]
async fn test_desktop_identity_answers_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("sec-ch-ua-mobile", "?1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("mobile"))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/topic--1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher(2).fetch(&page_url(&mock_server)).await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_retry_after_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second try"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher(2).fetch(&page_url(&mock_server)).await.unwrap();
    assert_eq!(body, "second try");
}

#[tokio::test]
async fn test_falls_back_to_mobile_identity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("sec-ch-ua-mobile", "?1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("mobile page"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Desktop requests fall through to the blocking mock
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&mock_server)
        .await;

    let body = fetcher(2).fetch(&page_url(&mock_server)).await.unwrap();
    assert_eq!(body, "mobile page");
}

#[tokio::test]
async fn test_empty_body_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher(1).fetch(&page_url(&mock_server)).await.unwrap();
    assert_eq!(body, "content");
}

#[tokio::test]
async fn test_all_attempts_fail_reports_last_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;

    let err = fetcher(2).fetch(&page_url(&mock_server)).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(matches!(err, FetchError::Status { .. }));
}

#[tokio::test]
async fn test_empty_body_on_every_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let err = fetcher(1).fetch(&page_url(&mock_server)).await.unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody { .. }));
}

#[tokio::test]
async fn test_sends_origin_referer() {
    let mock_server = MockServer::start().await;
    let referer = format!("{}/", mock_server.uri());

    Mock::given(method("GET"))
        .and(header("referer", referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher(1).fetch(&page_url(&mock_server)).await.unwrap();
    assert_eq!(body, "ok");
}
