// src/lib.rs
// Public library surface for the service binary, the CLI and integration tests.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod llm;
pub mod metrics;
pub mod model;
pub mod workflow;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::model::{AnalysisRequest, CombinedResult};
pub use crate::workflow::Workflow;

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::fetch::providers::ScraperFetcher;

/// Structured logging: `RUST_LOG` filter (default `webs=info,warn`), `LOG_FORMAT=json`
/// for JSON lines. A subscriber installed by the host runtime takes precedence.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("webs=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Workflow wired with the scraper fetcher and configured LLM clients.
pub fn build_workflow(cfg: &AppConfig) -> anyhow::Result<Workflow> {
    let fetcher = ScraperFetcher::new(&cfg.scraper, cfg.pipeline.fetch_timeout())
        .context("building content fetcher")?;
    let llms = llm::build_clients_from_config(&cfg.llm, cfg.pipeline.llm_timeout())
        .context("building LLM clients")?;
    Ok(Workflow::new(Arc::new(fetcher), llms, cfg.pipeline.clone()))
}

/// Full application router: API routes plus `/metrics` when `DEBUG_ROUTES=1`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load().context("loading configuration")?;
    let workflow = build_workflow(&cfg)?;
    let mut router = create_router(AppState::new(workflow));

    let debug_routes = std::env::var("DEBUG_ROUTES")
        .map(|v| v == "1")
        .unwrap_or(false);
    if debug_routes {
        let m = crate::metrics::Metrics::global(&cfg.pipeline)?;
        router = router.merge(m.router());
        info!(target: "webs::api", "debug routes enabled (/metrics)");
    }

    info!(
        target: "webs::api",
        llm_enabled = cfg.llm.enabled,
        provider = %cfg.llm.provider,
        scraper = %cfg.scraper.base_url,
        "router ready"
    );
    Ok(router)
}
