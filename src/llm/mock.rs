// src/llm/mock.rs
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{ChatMessage, LlmClient};
use crate::analysis::prompts;
use crate::error::LlmError;

/// Used when the LLM is switched off in config. Every call fails.
pub struct DisabledClient;

impl LlmClient for DisabledClient {
    fn generate<'a>(
        &'a self,
        _messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async { Err(LlmError::Disabled) })
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

type Responder = dyn Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync;

/// Deterministic client for tests and local runs: a closure decides the reply.
pub struct ScriptedClient {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    /// Extra delay for conversations mentioning a marker (e.g. one URL).
    delays_when: Vec<(String, Duration)>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            delays_when: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Plausible canned JSON for each agent, picked by system prompt (`AI_TEST_MODE=mock`).
    pub fn canned() -> Self {
        Self::new(canned_reply)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep for `delay` before answering any conversation whose text contains `marker`.
    pub fn with_delay_when(mut self, marker: impl Into<String>, delay: Duration) -> Self {
        self.delays_when.push((marker.into(), delay));
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmClient for ScriptedClient {
    fn generate<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            let extra = self
                .delays_when
                .iter()
                .filter(|(marker, _)| messages.iter().any(|m| m.content.contains(marker.as_str())))
                .map(|(_, d)| *d)
                .max();
            if let Some(d) = extra {
                tokio::time::sleep(d).await;
            }
            (self.responder)(messages)
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn canned_reply(messages: &[ChatMessage]) -> Result<String, LlmError> {
    let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
    let reply = if system == prompts::QUICK_METADATA_SYSTEM {
        json!({
            "title": "Mock batch",
            "emoji": "🧪",
            "description": "Canned metadata for a local run.",
            "suggestedTopics": ["testing"]
        })
    } else if system == prompts::URL_ANALYSIS_SYSTEM {
        json!({
            "topics": ["testing"],
            "sentiment": "neutral",
            "summary": "Canned analysis of the page.",
            "insights": ["Mock mode is on."],
            "entities": [],
            "readingTime": 1,
            "confidence": 0.5
        })
    } else if system == prompts::COMBINE_SYSTEM {
        json!({
            "fullDescription": "Canned overview of every analyzed page.",
            "enhancedInsights": []
        })
    } else {
        return Err(LlmError::EmptyResponse);
    };
    Ok(reply.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_always_fails() {
        let err = DisabledClient
            .generate(&[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Disabled));
    }

    #[tokio::test]
    async fn canned_client_answers_per_agent() {
        let c = ScriptedClient::canned();
        let out = c
            .generate(&[
                ChatMessage::system(prompts::COMBINE_SYSTEM),
                ChatMessage::user("{}"),
            ])
            .await
            .unwrap();
        assert!(out.contains("fullDescription"));
        assert_eq!(c.calls(), 1);

        let unknown = c.generate(&[ChatMessage::user("?")]).await;
        assert!(unknown.is_err());
    }
}
