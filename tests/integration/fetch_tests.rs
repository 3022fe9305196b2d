//! Transport tests: route fallback, relays and the render endpoint

use std::sync::Arc;
use std::time::Duration;
use sumi_sweep::config::Config;
use sumi_sweep::crawler::{
    build_http_client, FetchError, FetchRoute, FetchStrategy, HttpTransport, Transport,
};
use sumi_sweep::CanonicalUrl;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

fn transport(routes: Vec<FetchRoute>) -> HttpTransport {
    let client = build_http_client(&Config::default().fetch).expect("Failed to build client");
    HttpTransport::new(client, routes)
}

#[tokio::test]
async fn test_direct_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<p>direct</p>"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
    let page = transport(vec![FetchRoute::Direct])
        .fetch(&url)
        .await
        .expect("Direct fetch failed");

    assert_eq!(page.body, "<p>direct</p>");
    assert_eq!(page.final_url, url);
}

#[tokio::test]
async fn test_direct_route_reports_redirect_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<p>new</p>"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
    let page = transport(vec![FetchRoute::Direct]).fetch(&url).await.unwrap();

    assert_eq!(page.final_url.path(), "/new");
}

#[tokio::test]
async fn test_falls_back_to_relay() {
    let server = MockServer::start().await;
    let target = format!("{}/page", server.uri());

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", target.as_str()))
        .respond_with(html("<p>relayed</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let relay = FetchRoute::parse(&format!("{}/relay?url={{url}}", server.uri())).unwrap();
    let url = Url::parse(&target).unwrap();
    let page = transport(vec![FetchRoute::Direct, relay])
        .fetch(&url)
        .await
        .expect("Relay fetch failed");

    assert_eq!(page.body, "<p>relayed</p>");
    assert_eq!(page.final_url, url);
}

#[tokio::test]
async fn test_all_routes_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let relay = FetchRoute::parse(&format!("{}/relay?url={{url}}", server.uri())).unwrap();
    let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
    let result = transport(vec![FetchRoute::Direct, relay]).fetch(&url).await;

    assert!(matches!(
        result,
        Err(FetchError::AllRoutesExhausted { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_strategy_renders_script_pages_via_endpoint() {
    let server = MockServer::start().await;
    let target = format!("{}/app", server.uri());

    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(html(
            r#"<div id="root"></div><script src="/static/react.min.js"></script>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .and(query_param("url", target.as_str()))
        .respond_with(html(r#"<a href="/pricing">Pricing</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.crawl.use_rendering_transport = true;
    config.fetch.routes = vec!["direct".to_string()];
    config.fetch.render_endpoint = Some(format!("{}/render?url={{url}}", server.uri()));

    let strategy = FetchStrategy::from_config(&config).unwrap();
    let url: CanonicalUrl = target.parse().unwrap();
    let outcome = strategy.fetch(&url).await.expect("Rendered fetch failed");

    assert!(outcome.rendered);
    assert_eq!(outcome.content, r#"<a href="/pricing">Pricing</a>"#);
    assert_eq!(outcome.final_url, url);
}

#[tokio::test]
async fn test_render_endpoint_timeout() {
    let server = MockServer::start().await;
    let target = format!("{}/slow", server.uri());

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(r#"<script>window.__NUXT__={}</script>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = build_http_client(&Config::default().fetch).unwrap();
    let plain = HttpTransport::new(client.clone(), vec![FetchRoute::Direct]);
    let renderer = HttpTransport::new(
        client,
        vec![FetchRoute::parse(&format!("{}/render?url={{url}}", server.uri())).unwrap()],
    );
    let strategy = FetchStrategy::new(Arc::new(plain))
        .with_renderer(Arc::new(renderer), Duration::from_millis(100));

    let result = strategy.fetch(&target.parse().unwrap()).await;
    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}
