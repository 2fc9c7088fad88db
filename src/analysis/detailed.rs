// src/analysis/detailed.rs
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::decode::decode_url_analysis;
use super::prompts;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, StepFailure};
use crate::fetch::{host_of, FetchResult};
use crate::llm::{generate_with_deadline, ChatMessage, LlmClient};
use crate::model::{FailedUrl, FailureStage, UrlAnalysis};

const WORDS_PER_MINUTE: f64 = 200.0;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("webs_analysis_total", "Per-URL analyses by outcome.");
    });
}

/// Output of the analysis branch.
#[derive(Debug, Clone, Default)]
pub struct DetailedAnalysis {
    /// Successful analyses, in input order.
    pub url_analyses: Vec<UrlAnalysis>,
    pub successful_count: usize,
    pub failed_count: usize,
    /// URLs that fetched but could not be analyzed.
    pub failures: Vec<FailedUrl>,
}

/// Minutes at an average reading pace; at least one minute for non-empty text.
pub fn estimate_reading_time(content: &str) -> f64 {
    let words = content.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }
    (words as f64 / WORDS_PER_MINUTE).ceil()
}

/// Analyze one fetched page with the detailed model.
pub async fn analyze_one(
    llm: &dyn LlmClient,
    fetch: &FetchResult,
    prompt: Option<&str>,
    cfg: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<UrlAnalysis, StepFailure> {
    let messages = [
        ChatMessage::system(prompts::URL_ANALYSIS_SYSTEM),
        ChatMessage::user(prompts::url_analysis_user(fetch, prompt, cfg.max_content_chars)),
    ];
    let reply =
        generate_with_deadline(llm, &messages, cfg.llm_timeout(), cancel, "url_analysis").await?;
    let analysis = decode_url_analysis(&reply, &fetch.url, estimate_reading_time(&fetch.content))?;
    Ok(analysis)
}

/// Analyze every successful fetch of `urls`. Failed fetches are skipped; per-URL
/// failures are dropped and recorded. Errors only when nothing could be analyzed.
pub async fn analyze_all(
    llm: &dyn LlmClient,
    urls: &[String],
    prompt: Option<&str>,
    fetches: &[FetchResult],
    cfg: &PipelineConfig,
    cancel: &CancellationToken,
) -> PipelineResult<DetailedAnalysis> {
    ensure_metrics_described();

    let inputs: Vec<&FetchResult> = fetches
        .iter()
        .filter(|f| f.success && urls.contains(&f.url))
        .collect();
    let attempted = inputs.len();

    let futs: Vec<_> = inputs
        .iter()
        .map(|f| async move { (*f, analyze_one(llm, f, prompt, cfg, cancel).await) })
        .collect();
    let outcomes: Vec<_> = stream::iter(futs)
        .buffered(cfg.concurrency_for(attempted))
        .collect()
        .await;

    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    let mut out = DetailedAnalysis::default();
    for (fetch, outcome) in outcomes {
        match outcome {
            Ok(a) => {
                counter!("webs_analysis_total", "outcome" => "ok").increment(1);
                debug!(target: "webs::llm", host = %host_of(&fetch.url), confidence = a.confidence, "analyzed");
                out.url_analyses.push(a);
            }
            Err(e) => {
                counter!("webs_analysis_total", "outcome" => "error").increment(1);
                warn!(target: "webs::llm", host = %host_of(&fetch.url), error = %e, "analysis dropped");
                out.failures.push(FailedUrl {
                    url: fetch.url.clone(),
                    stage: FailureStage::Analysis,
                    reason: e.to_string(),
                });
            }
        }
    }
    out.successful_count = out.url_analyses.len();
    out.failed_count = out.failures.len();

    if out.successful_count == 0 {
        return Err(PipelineError::AllAnalysesFailed { attempted });
    }
    Ok(out)
}
