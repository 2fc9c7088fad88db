// src/fetch/mod.rs
pub mod extract;
pub mod providers;
pub mod types;

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::FetchError;
pub use crate::fetch::types::{ContentFetcher, FetchMetadata, FetchResult};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("webs_fetch_total", "URL fetch attempts by outcome.");
        describe_histogram!("webs_fetch_ms", "URL fetch time in milliseconds.");
    });
}

/// Host part of a URL for logs; never log the full content.
pub(crate) fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "invalid-url".to_string())
}

/// Fetch a single URL under the configured deadline. Failures become a failed
/// `FetchResult`; this never returns an error.
pub async fn fetch_one(
    fetcher: &dyn ContentFetcher,
    url: &str,
    cfg: &PipelineConfig,
    cancel: &CancellationToken,
) -> FetchResult {
    let t0 = Instant::now();
    let timeout = cfg.fetch_timeout();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        res = tokio::time::timeout(timeout, fetcher.fetch_text(url)) => match res {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout { ms: cfg.fetch_timeout_ms }),
        },
    };

    let ms = t0.elapsed().as_millis() as u64;
    histogram!("webs_fetch_ms").record(ms as f64);

    match outcome {
        Ok(content) => {
            counter!("webs_fetch_total", "outcome" => "ok").increment(1);
            let res = FetchResult::succeeded(url, content, ms);
            debug!(
                target: "webs::fetch",
                host = %host_of(url),
                chars = res.metadata.content_length,
                ms,
                provider = fetcher.name(),
                "fetched"
            );
            res
        }
        Err(e) => {
            counter!("webs_fetch_total", "outcome" => "error").increment(1);
            warn!(
                target: "webs::fetch",
                host = %host_of(url),
                error = %e,
                ms,
                provider = fetcher.name(),
                "fetch failed"
            );
            FetchResult::failed(url, e.to_string(), ms)
        }
    }
}

/// Fetch every URL concurrently. One result per input URL, in input order.
pub async fn fetch_all(
    fetcher: &dyn ContentFetcher,
    urls: &[String],
    cfg: &PipelineConfig,
    cancel: &CancellationToken,
) -> Vec<FetchResult> {
    ensure_metrics_described();

    let limit = cfg.concurrency_for(urls.len());
    let futs: Vec<_> = urls
        .iter()
        .map(|u| fetch_one(fetcher, u, cfg, cancel))
        .collect();
    stream::iter(futs).buffered(limit).collect().await
}
