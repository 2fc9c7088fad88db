// src/analysis/combine.rs
use chrono::{SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::aggregate;
use super::decode::decode_combined;
use super::detailed::DetailedAnalysis;
use super::prompts;
use crate::config::PipelineConfig;
use crate::error::StepFailure;
use crate::fetch::FetchResult;
use crate::llm::{generate_with_deadline, ChatMessage, LlmClient};
use crate::model::{
    AnalysisRequest, CombinedResult, FailedUrl, FailureStage, QuickMetadata, ResultMetadata,
    UrlAnalysis,
};

/// Everything the combiner needs, reshaped from the two branches.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineInput {
    pub urls: Vec<String>,
    pub prompt: Option<String>,
    pub quick_metadata: QuickMetadata,
    pub url_analyses: Vec<UrlAnalysis>,
    /// Dropped URLs in request order, whichever stage dropped them.
    pub failed_urls: Vec<FailedUrl>,
}

impl CombineInput {
    /// Mapper step: pure reshaping, no I/O.
    pub fn from_branches(
        request: &AnalysisRequest,
        fetches: &[FetchResult],
        quick_metadata: QuickMetadata,
        detailed: DetailedAnalysis,
    ) -> Self {
        let mut analysis_failures = detailed.failures;
        let mut failed_urls = Vec::new();
        for f in fetches {
            if !f.success {
                failed_urls.push(FailedUrl {
                    url: f.url.clone(),
                    stage: FailureStage::Fetch,
                    reason: f.error.clone().unwrap_or_default(),
                });
            } else if let Some(pos) = analysis_failures.iter().position(|x| x.url == f.url) {
                failed_urls.push(analysis_failures.remove(pos));
            }
        }

        Self {
            urls: request.urls.clone(),
            prompt: request.focus_prompt().map(str::to_string),
            quick_metadata,
            url_analyses: detailed.url_analyses,
            failed_urls,
        }
    }
}

/// One detailed-model call for the narrative; merged lists are computed here.
pub async fn combine(
    llm: &dyn LlmClient,
    input: CombineInput,
    cfg: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<CombinedResult, StepFailure> {
    let messages = [
        ChatMessage::system(prompts::COMBINE_SYSTEM),
        ChatMessage::user(prompts::combine_user(
            &input.urls,
            input.prompt.as_deref(),
            &input.quick_metadata,
            &input.url_analyses,
        )),
    ];

    let reply = generate_with_deadline(llm, &messages, cfg.llm_timeout(), cancel, "combine")
        .await
        .map_err(|e| {
            warn!(target: "webs::llm", agent = "combine", provider = llm.provider_name(), error = %e, "call failed");
            e
        })?;
    let narrative = decode_combined(&reply).map_err(|e| {
        warn!(target: "webs::llm", agent = "combine", error = %e, "undecodable reply");
        e
    })?;

    let analyzed: Vec<&str> = input.url_analyses.iter().map(|a| a.url.as_str()).collect();
    let connections = narrative
        .cross_url_connections
        .map(|c| aggregate::filter_connections(c, &analyzed));
    debug!(
        target: "webs::llm",
        agent = "combine",
        connections = connections.as_ref().map(Vec::len).unwrap_or(0),
        "decoded"
    );

    let quick = input.quick_metadata;
    let topics = aggregate::merge_topics(&input.url_analyses, quick.suggested_topics.as_deref());

    Ok(CombinedResult {
        title: narrative.title.or(quick.title),
        emoji: narrative.emoji.or(quick.emoji),
        description: narrative.description.or(quick.description),
        full_description: narrative.full_description,
        topics,
        sentiment: aggregate::majority_sentiment(&input.url_analyses),
        entities: aggregate::merge_entities(&input.url_analyses),
        insights: aggregate::merge_insights(&input.url_analyses, cfg.insights_limit),
        related_urls: aggregate::merge_related_urls(&input.url_analyses),
        enhanced_insights: narrative.enhanced_insights,
        cross_url_connections: connections,
        metadata: ResultMetadata {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            url_count: input.urls.len(),
            processing_steps: Vec::new(),
            successful_count: input.url_analyses.len(),
            failed_count: input.failed_urls.len(),
            failed_urls: input.failed_urls,
        },
        url_analyses: input.url_analyses,
    })
}
