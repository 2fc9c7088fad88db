// src/analysis/metadata.rs
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::decode::decode_quick_metadata;
use super::prompts;
use crate::config::PipelineConfig;
use crate::error::StepFailure;
use crate::fetch::FetchResult;
use crate::llm::{generate_with_deadline, ChatMessage, LlmClient};
use crate::model::QuickMetadata;

/// One fast-model call for the whole batch. Any failure is returned as is; no fallback.
pub async fn quick_metadata(
    llm: &dyn LlmClient,
    urls: &[String],
    prompt: Option<&str>,
    fetches: &[FetchResult],
    cfg: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<QuickMetadata, StepFailure> {
    let messages = [
        ChatMessage::system(prompts::QUICK_METADATA_SYSTEM),
        ChatMessage::user(prompts::quick_metadata_user(urls, prompt, fetches)),
    ];

    let reply = generate_with_deadline(llm, &messages, cfg.llm_timeout(), cancel, "quick_metadata")
        .await
        .map_err(|e| {
            warn!(target: "webs::llm", agent = "quick_metadata", provider = llm.provider_name(), error = %e, "call failed");
            e
        })?;

    let meta = decode_quick_metadata(&reply).map_err(|e| {
        warn!(target: "webs::llm", agent = "quick_metadata", error = %e, "undecodable reply");
        e
    })?;
    debug!(target: "webs::llm", agent = "quick_metadata", title = ?meta.title, "decoded");
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, LlmError};
    use crate::llm::{DisabledClient, ScriptedClient};

    fn fetches() -> Vec<FetchResult> {
        vec![FetchResult::succeeded("https://a.test", "# A\nbody".to_string(), 1)]
    }

    #[tokio::test]
    async fn fenced_reply_is_decoded() {
        let llm = ScriptedClient::fixed("```json\n{\"title\":\"Batch\",\"emoji\":\"📦\"}\n```");
        let urls = vec!["https://a.test".to_string()];
        let m = quick_metadata(&llm, &urls, None, &fetches(), &PipelineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(m.title.as_deref(), Some("Batch"));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn llm_and_decode_failures_surface() {
        let urls = vec!["https://a.test".to_string()];
        let cfg = PipelineConfig::default();
        let err = quick_metadata(&DisabledClient, &urls, None, &fetches(), &cfg, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepFailure::Llm(LlmError::Disabled)));

        let prose = ScriptedClient::fixed("Here you go: a nice title");
        let err = quick_metadata(&prose, &urls, None, &fetches(), &cfg, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepFailure::Decode(DecodeError::Json(_))));
    }
}
