// tests/app_bootstrap.rs
//
// Full in-process app as the service builds it: config from files/env,
// mock models, debug routes.

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use std::io::Write;
use tower::ServiceExt;

async fn build_app() -> Router {
    webs_analyzer::app()
        .await
        .expect("app() should build Router in tests")
}

#[tokio::test]
#[serial]
async fn app_serves_health_and_metrics_with_debug_routes() {
    std::env::set_var("DEBUG_ROUTES", "1");
    std::env::set_var("AI_TEST_MODE", "mock");
    std::env::set_var("LLM_CONFIG_PATH", "does/not/exist.json");
    let app = build_app().await;

    let resp = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1_048_576)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(text.contains("webs_run_timeout_ms"), "metrics body: {text}");

    std::env::remove_var("DEBUG_ROUTES");
    std::env::remove_var("AI_TEST_MODE");
    std::env::remove_var("LLM_CONFIG_PATH");
}

#[tokio::test]
#[serial]
async fn metrics_route_is_absent_without_flag() {
    std::env::remove_var("DEBUG_ROUTES");
    std::env::set_var("LLM_CONFIG_PATH", "does/not/exist.json");
    let app = build_app().await;
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    std::env::remove_var("LLM_CONFIG_PATH");
}

#[tokio::test]
#[serial]
async fn pipeline_config_file_is_picked_up() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "run_timeout_ms = 1234\nmax_concurrency = 2").unwrap();
    std::env::set_var("PIPELINE_CONFIG_PATH", f.path());
    std::env::remove_var("PIPELINE_RUN_TIMEOUT_MS");
    std::env::remove_var("PIPELINE_MAX_CONCURRENCY");

    let cfg = webs_analyzer::config::PipelineConfig::load().unwrap();
    assert_eq!(cfg.run_timeout_ms, 1234);
    assert_eq!(cfg.max_concurrency, 2);

    std::env::set_var("PIPELINE_CONFIG_PATH", "missing/pipeline.toml");
    assert!(webs_analyzer::config::PipelineConfig::load().is_err());
    std::env::remove_var("PIPELINE_CONFIG_PATH");
}

#[tokio::test]
#[serial]
async fn run_counters_show_up_on_metrics() {
    std::env::set_var("DEBUG_ROUTES", "1");
    std::env::set_var("AI_TEST_MODE", "mock");
    std::env::set_var("LLM_CONFIG_PATH", "does/not/exist.json");
    // nothing listens on the discard port, so every fetch fails fast
    std::env::set_var("SCRAPER_BASE_URL", "http://127.0.0.1:9");
    let app = build_app().await;

    let resp = app
        .clone()
        .oneshot(
            Request::post("/analyze")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"urls":["https://a.test"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1_048_576)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(text.contains("webs_fetch_total"), "metrics body: {text}");
    assert!(text.contains("webs_runs_total"), "metrics body: {text}");
    assert!(text.contains("all_fetches_failed"), "metrics body: {text}");

    std::env::remove_var("DEBUG_ROUTES");
    std::env::remove_var("AI_TEST_MODE");
    std::env::remove_var("LLM_CONFIG_PATH");
    std::env::remove_var("SCRAPER_BASE_URL");
}
