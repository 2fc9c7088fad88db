// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt as _; // for `oneshot`

use webs_analyzer::analysis::prompts;
use webs_analyzer::config::PipelineConfig;
use webs_analyzer::fetch::providers::FixtureFetcher;
use webs_analyzer::llm::{ChatMessage, DisabledClient, LlmSet, ScriptedClient};
use webs_analyzer::{create_router, AppState, Workflow};

const BODY_LIMIT: usize = 1024 * 1024;

fn scripted() -> ScriptedClient {
    ScriptedClient::new(|m: &[ChatMessage]| {
        let reply = if m[0].content == prompts::QUICK_METADATA_SYSTEM {
            json!({ "title": "Batch", "emoji": "📰", "suggestedTopics": ["news"] })
        } else if m[0].content == prompts::URL_ANALYSIS_SYSTEM {
            json!({
                "topics": ["news"], "sentiment": "neutral", "summary": "A page.",
                "insights": [], "entities": [], "readingTime": 1, "confidence": 0.6
            })
        } else {
            json!({ "fullDescription": "One page about news." })
        };
        Ok(reply.to_string())
    })
}

fn router_with(llms: LlmSet) -> Router {
    let fetcher = FixtureFetcher::new()
        .with_page("https://news.test/a", "# Headline\nBody")
        .with_status("https://news.test/missing", 404, "Not Found");
    let wf = Workflow::new(Arc::new(fetcher), llms, PipelineConfig::default());
    create_router(AppState::new(wf))
}

fn test_router() -> Router {
    router_with(LlmSet::single(Arc::new(scripted())))
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn post_analyze(payload: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /analyze")
}

#[tokio::test]
async fn health_returns_ok() {
    let resp = test_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn analyze_returns_camel_case_combined_result() {
    let payload = json!({
        "urls": ["https://news.test/a", "https://news.test/missing"],
        "prompt": "headlines",
        "webId": "web-1"
    });
    let resp = test_router()
        .oneshot(post_analyze(&payload.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["fullDescription"], "One page about news.");
    assert_eq!(v["title"], "Batch");
    assert_eq!(v["urlAnalyses"].as_array().unwrap().len(), 1);
    assert_eq!(v["urlAnalyses"][0]["url"], "https://news.test/a");
    assert_eq!(v["metadata"]["urlCount"], 2);
    assert_eq!(v["metadata"]["failedUrls"][0]["stage"], "fetch");
    assert_eq!(v["sentiment"], "neutral");
}

#[tokio::test]
async fn malformed_body_and_bad_urls_are_400() {
    let app = test_router();

    let resp = app.clone().oneshot(post_analyze("{not json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["kind"], "invalid_request");

    let resp = app
        .oneshot(post_analyze(r#"{"urls":["nope"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pipeline_failures_are_502() {
    let resp = test_router()
        .oneshot(post_analyze(r#"{"urls":["https://news.test/missing"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v = json_body(resp).await;
    assert_eq!(v["error"], "All URL fetches failed");
    assert_eq!(v["kind"], "all_fetches_failed");

    let disabled = router_with(LlmSet::single(Arc::new(DisabledClient)));
    let resp = disabled
        .oneshot(post_analyze(r#"{"urls":["https://news.test/a"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(resp).await["kind"], "quick_metadata_failed");
}

#[tokio::test]
async fn debug_runs_lists_recent_runs() {
    let app = test_router();
    let _ = app
        .clone()
        .oneshot(post_analyze(r#"{"urls":["https://news.test/a"],"webId":"w-9"}"#))
        .await
        .unwrap();
    let _ = app
        .clone()
        .oneshot(post_analyze(r#"{"urls":["https://news.test/missing"]}"#))
        .await
        .unwrap();

    let resp = app
        .oneshot(Request::get("/debug/runs?limit=5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    let runs = v.as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["web_id"], "w-9");
    assert_eq!(runs[0]["outcome"], "ok");
    assert_eq!(runs[1]["outcome"], "all_fetches_failed");
    assert_eq!(runs[1]["failed_step"], "fetch");
}
