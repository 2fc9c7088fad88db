// tests/scraper_fetcher.rs
//
// ScraperFetcher against a local stand-in for the extraction service.

use std::time::Duration;

use axum::{
    http::{header, HeaderMap, StatusCode, Uri},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use webs_analyzer::config::{PipelineConfig, ScraperConfig};
use webs_analyzer::error::FetchError;
use webs_analyzer::fetch::providers::ScraperFetcher;
use webs_analyzer::fetch::{fetch_one, ContentFetcher};

async fn reader(uri: Uri, headers: HeaderMap) -> (StatusCode, String) {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if accept != "text/plain" {
        return (StatusCode::NOT_ACCEPTABLE, "text only".into());
    }
    if auth != "Bearer secret" {
        return (StatusCode::UNAUTHORIZED, "x".repeat(500));
    }
    (StatusCode::OK, format!("# Fetched\npath={}", uri.path()))
}

async fn spawn_reader() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(reader);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fetcher(base: &str, key: Option<&str>) -> ScraperFetcher {
    let cfg = ScraperConfig {
        base_url: base.to_string(),
        api_key: key.map(str::to_string),
    };
    ScraperFetcher::new(&cfg, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn sends_accept_and_bearer_and_returns_text() {
    let base = spawn_reader().await;
    let res = fetch_one(
        &fetcher(&base, Some("secret")),
        "https://a.test/page",
        &PipelineConfig::default(),
        &CancellationToken::new(),
    )
    .await;

    assert!(res.success, "error: {:?}", res.error);
    assert_eq!(res.title.as_deref(), Some("Fetched"));
    assert!(res.content.ends_with("path=/https://a.test/page"));
    assert_eq!(res.metadata.content_length, res.content.chars().count());
}

#[tokio::test]
async fn non_2xx_becomes_status_error_with_short_body() {
    let base = spawn_reader().await;
    let err = fetcher(&base, None)
        .fetch_text("https://a.test/page")
        .await
        .unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body.chars().count(), 200);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let res = fetch_one(
        &fetcher(&format!("http://{addr}"), None),
        "https://a.test",
        &PipelineConfig::default(),
        &CancellationToken::new(),
    )
    .await;
    assert!(!res.success);
    assert!(res.error.is_some());
    assert_eq!(res.content, "");
}
