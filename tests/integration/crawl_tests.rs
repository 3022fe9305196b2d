//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sumi_sweep::config::{Config, CrawlConfig};
use sumi_sweep::crawler::{Crawler, FetchStrategy};
use sumi_sweep::output::{export_results, ExportFormat};
use sumi_sweep::RunState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration using only the direct route and no pacing
fn create_test_config(max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawl = CrawlConfig {
        max_pages,
        delay_ms: 0,
        use_rendering_transport: false,
    };
    config.fetch.routes = vec!["direct".to_string()];
    config.fetch.timeout_secs = 5;
    config
}

fn create_crawler(config: &Config) -> Crawler {
    let strategy = FetchStrategy::from_config(config).expect("Failed to build fetch strategy");
    Crawler::new(config.crawl.clone(), strategy)
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/about">About</a>
            <a href="/about?utm_source=nav">About again</a>
            <a href="/missing">Broken</a>
            <a href="https://external.example/">Elsewhere</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        r#"<a href="/">Home</a><a href="/team/">Team</a><img src="/logo.png">"#,
    )
    .await;
    mount_page(&server, "/team", "<p>The team</p>").await;
    // /missing is not mounted and answers 404

    let config = create_test_config(100);
    let results = create_crawler(&config)
        .start(&format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    let visited: Vec<String> = results.urls.iter().map(|u| u.to_string()).collect();
    assert_eq!(
        visited,
        vec![
            format!("{}/", base_url),
            format!("{}/about", base_url),
            format!("{}/team", base_url),
        ]
    );
    assert_eq!(results.failed_urls.len(), 1);
    assert_eq!(results.failed_urls[0].as_str(), format!("{}/missing", base_url));

    assert_eq!(results.state, RunState::Completed);
    assert_eq!(results.stats.succeeded, 3);
    assert_eq!(results.stats.failed, 1);
    assert_eq!(results.stats.external, 1);
    // 4 links on the home page, 3 on /about
    assert_eq!(results.stats.discovered, 7);
    // The tracking-parameter variant of /about and the link back home
    assert_eq!(results.stats.duplicate, 2);
}

#[tokio::test]
async fn test_page_budget() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/1">1</a><a href="/2">2</a><a href="/3">3</a><a href="/4">4</a>"#,
    )
    .await;
    for page in ["/1", "/2", "/3", "/4"] {
        mount_page(&server, page, "<p>leaf</p>").await;
    }

    let config = create_test_config(3);
    let results = create_crawler(&config)
        .start(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(results.state, RunState::Completed);
    assert_eq!(results.total_pages, 3);
}

#[tokio::test]
async fn test_redirect_counts_as_duplicate() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<p>moved here</p>").await;

    let config = create_test_config(10);
    let results = create_crawler(&config)
        .start(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(results.stats.succeeded, 2);
    assert_eq!(results.stats.duplicate, 1);
    assert_eq!(results.total_pages, 2);
}

#[tokio::test]
async fn test_crawl_and_export_csv() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", r#"<a href="/docs">Docs</a><a href="/gone">Gone</a>"#).await;
    mount_page(&server, "/docs", "<p>docs</p>").await;

    let config = create_test_config(10);
    let results = create_crawler(&config)
        .start(&format!("{}/", base_url))
        .await
        .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let output = dir.path().join("results.csv");
    export_results(&results, ExportFormat::Csv, &output).expect("Export failed");

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "url,status");
    assert_eq!(lines[1], format!("{}/,visited", base_url));
    assert_eq!(lines[2], format!("{}/docs,visited", base_url));
    assert_eq!(lines[3], format!("{}/gone,failed", base_url));
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let config = create_test_config(10);
    let crawler = create_crawler(&config);

    let result = crawler.start("not a url").await;

    assert!(matches!(
        result,
        Err(sumi_sweep::SweepError::InvalidSeed { .. })
    ));
    assert_eq!(crawler.state(), RunState::Idle);
}
