use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::{ChatMessage, LlmClient};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::fetch::extract::truncate_chars;

/// OpenAI-compatible provider (Chat Completions API). Works for OpenAI and OpenRouter.
pub struct OpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(cfg: &LlmConfig, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("webs-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building LLM http client")?;
        Ok(Self {
            http,
            endpoint: cfg.chat_completions_url(),
            api_key: cfg.api_key.clone(),
            model: model.to_string(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Disabled);
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), 300).to_string(),
            });
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }
}

impl LlmClient for OpenAiProvider {
    fn generate<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(messages))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_reported_as_disabled() {
        let cfg = LlmConfig {
            enabled: true,
            ..LlmConfig::default()
        };
        let p = OpenAiProvider::new(&cfg, "gpt-4o-mini", Duration::from_secs(1)).unwrap();
        let err = p.generate(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Disabled));
    }
}
