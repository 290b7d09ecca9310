//! Full harvest runs against a mock forum

use std::fs;
use std::path::Path;
use thread_harvest::config::{Config, DelayWindow};
use thread_harvest::crawler::{harvest, Harvester};
use thread_harvest::HarvestError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC: &str = "/some-topic--8000065";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.source.url = Some(format!("{}{}?a=popular", server.uri(), TOPIC));
    config.fetch.timeout_secs = 5;
    config.fetch.retries_per_identity = 1;
    config.fetch.backoff_base_ms = 0;
    config.fetch.backoff_cap_ms = 0;
    config.fetch.jitter = DelayWindow::zero();
    config.pacing.between_pages = DelayWindow::zero();
    config.pacing.walk_step = DelayWindow::zero();
    config.output.output_dir = output_dir.to_string_lossy().into_owned();
    config
}

/// A thread page with `count` entries and pager links to `links`
fn thread_page(page: u32, count: usize, links: &[u32]) -> String {
    let pinned = if page == 1 {
        r#"<div id="pinned-entry"><div class="content">pinned &amp; first</div></div>"#
    } else {
        ""
    };
    let items: String = (1..=count)
        .map(|n| {
            format!(
                r#"<li><div class="content">  p{} entry {}  </div></li>"#,
                page, n
            )
        })
        .collect();
    let pager: String = links
        .iter()
        .map(|p| {
            format!(
                r#"<a href="{}?a=popular&p={}">{}</a>"#,
                TOPIC, p, p
            )
        })
        .collect();

    format!(
        r#"<html><body>{}<div class="pager">{}</div><ul id="entry-item-list">{}</ul></body></html>"#,
        pinned, pager, items
    )
}

async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(TOPIC))
        .and(query_param("a", "popular"))
        .and(query_param("p", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_with_sequential_walk() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    // Pages hold 2, 3, 0 and 1 entries; no pager evidence beyond page 1
    mount_page(&mock_server, 1, thread_page(1, 2, &[1])).await;
    mount_page(&mock_server, 2, thread_page(2, 3, &[])).await;
    mount_page(&mock_server, 3, thread_page(3, 0, &[])).await;
    mount_page(&mock_server, 4, thread_page(4, 1, &[])).await;

    let config = create_test_config(&mock_server, output.path());
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let summary = harvester.run().await;

    assert_eq!(summary.last_page, 2);
    // The pinned block of page 1 is an entry too
    assert_eq!(summary.entries, 6);
    assert!(summary.pages_skipped.is_empty());

    let path = summary.output_path.expect("No output file written");
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("some-topic--8000065_p1-2_"));
    assert!(name.ends_with(".txt"));

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert_eq!(
        text,
        "• pinned & first\n\n• p1 entry 1\n\n• p1 entry 2\n\n• p2 entry 1\n\n• p2 entry 2\n\n• p2 entry 3"
    );
}

#[tokio::test]
async fn test_link_evidence_needs_single_request() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_page(&mock_server, 1, thread_page(1, 1, &[2, 3, 7])).await;

    let config = create_test_config(&mock_server, output.path());
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let last = harvester.discover_last_page().await;

    assert_eq!(last.page, 7);
    assert!(!last.fell_back());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_page(&mock_server, 1, thread_page(1, 1, &[2, 3, 4])).await;
    mount_page(&mock_server, 2, thread_page(2, 1, &[])).await;
    // Page 3 is never mounted and answers 404
    mount_page(&mock_server, 4, thread_page(4, 1, &[])).await;

    let config = create_test_config(&mock_server, output.path());
    let summary = harvest(config).await.expect("Harvest setup failed");

    assert_eq!(summary.last_page, 4);
    assert_eq!(summary.pages_skipped, vec![3]);
    assert_eq!(summary.pages_collected, 3);

    let text = fs::read_to_string(summary.output_path.unwrap()).unwrap();
    assert!(text.contains("p2 entry 1\n\n• p4 entry 1"));
}

#[tokio::test]
async fn test_unreachable_first_page_uses_fallback() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, output.path());
    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let summary = harvester.run().await;

    assert!(summary.discovery_fell_back);
    assert_eq!(summary.last_page, 2);
    assert_eq!(summary.pages_skipped, vec![1, 2]);
    assert_eq!(summary.entries, 0);
    assert!(summary.output_path.is_none());
}

#[tokio::test]
async fn test_harvest_without_url_sends_nothing() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    let mut config = create_test_config(&mock_server, output.path());
    config.source.url = None;

    let result = harvest(config).await;

    assert!(matches!(result, Err(HarvestError::Config(_))));
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}
