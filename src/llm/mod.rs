//! LLM adapter: provider abstraction, deadline wrapper, client factory.
//!
//! The pipeline only ever sees `generate(messages) -> text`; model choice lives
//! in `config/llm.json`.

pub mod mock;
pub mod openai;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::LlmConfig;
use crate::error::LlmError;

pub use mock::{DisabledClient, ScriptedClient};
pub use openai::OpenAiProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait object used by the pipeline (and tests).
pub trait LlmClient: Send + Sync {
    /// Send the conversation and return the raw text of the model's reply.
    fn generate<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynLlmClient = Arc<dyn LlmClient>;

/// The two model tiers the pipeline uses.
#[derive(Clone)]
pub struct LlmSet {
    /// Quick batch metadata.
    pub fast: DynLlmClient,
    /// Per-URL analysis and combine.
    pub detailed: DynLlmClient,
}

impl LlmSet {
    pub fn new(fast: DynLlmClient, detailed: DynLlmClient) -> Self {
        Self { fast, detailed }
    }

    /// Same client for both tiers.
    pub fn single(client: DynLlmClient) -> Self {
        Self {
            fast: client.clone(),
            detailed: client,
        }
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("webs_llm_calls_total", "LLM calls by agent and outcome.");
    });
}

/// Run one `generate` under a deadline and the run's cancellation token.
pub async fn generate_with_deadline(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
    timeout: Duration,
    cancel: &CancellationToken,
    agent: &'static str,
) -> Result<String, LlmError> {
    ensure_metrics_described();

    let res = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LlmError::Cancelled),
        r = tokio::time::timeout(timeout, client.generate(messages)) => match r {
            Ok(inner) => inner,
            Err(_) => Err(LlmError::Timeout { ms: timeout.as_millis() as u64 }),
        },
    };

    let outcome = if res.is_ok() { "ok" } else { "error" };
    counter!("webs_llm_calls_total", "agent" => agent, "outcome" => outcome).increment(1);
    res
}

/// Factory: build both tiers according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns deterministic scripted clients with canned JSON.
/// * Else if `config.enabled==false`, returns disabled clients.
/// * Else builds OpenAI-compatible providers for the fast and detailed models.
pub fn build_clients_from_config(config: &LlmConfig, timeout: Duration) -> anyhow::Result<LlmSet> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::info!(target: "webs::llm", "AI_TEST_MODE=mock, using canned responses");
        return Ok(LlmSet::single(Arc::new(ScriptedClient::canned())));
    }

    if !config.enabled {
        tracing::warn!(target: "webs::llm", "LLM disabled in config; every run will fail at analysis");
        return Ok(LlmSet::single(Arc::new(DisabledClient)));
    }

    match config.provider.as_str() {
        "openai" | "openrouter" => {
            let fast = OpenAiProvider::new(config, &config.fast_model, timeout)?;
            let detailed = OpenAiProvider::new(config, &config.detailed_model, timeout)?;
            Ok(LlmSet::new(Arc::new(fast), Arc::new(detailed)))
        }
        other => anyhow::bail!("Unsupported LLM provider: {other}"),
    }
}
