use anyhow::Context;
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::config::PipelineConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the configured deadlines as gauges.
    /// Fails if a recorder is already installed in this process.
    pub fn init(cfg: &PipelineConfig) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        gauge!("webs_run_timeout_ms").set(cfg.run_timeout_ms as f64);
        gauge!("webs_llm_timeout_ms").set(cfg.llm_timeout_ms as f64);
        gauge!("webs_fetch_timeout_ms").set(cfg.fetch_timeout_ms as f64);

        Ok(Self { handle })
    }

    /// Process-wide instance; the recorder is installed on first use.
    pub fn global(cfg: &PipelineConfig) -> anyhow::Result<&'static Metrics> {
        static GLOBAL: OnceCell<Metrics> = OnceCell::new();
        GLOBAL.get_or_try_init(|| Self::init(cfg))
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
