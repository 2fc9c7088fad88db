// src/config/llm.rs
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_LLM_CONFIG_PATH: &str = "config/llm.json";
pub const ENV_LLM_CONFIG_PATH: &str = "LLM_CONFIG_PATH";

fn default_provider() -> String {
    "openai".to_string()
}
fn default_fast_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_detailed_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub enabled: bool,
    /// "openai" | "openrouter" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from OPENAI_API_KEY / OPENROUTER_API_KEY (by provider)
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's chat-completions base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used for quick batch metadata.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Model used for per-URL analysis and the combine step.
    #[serde(default = "default_detailed_model")]
    pub detailed_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            api_key: String::new(),
            base_url: None,
            fast_model: default_fast_model(),
            detailed_model: default_detailed_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    /// Resolve the path from `LLM_CONFIG_PATH`, falling back to `config/llm.json`.
    /// A missing file yields the disabled default.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_LLM_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_LLM_CONFIG_PATH.to_string());
        if !Path::new(&path).exists() {
            tracing::warn!(target: "webs::llm", %path, "LLM config not found, LLM disabled");
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading LLM config from {}", path.display()))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let mut cfg: LlmConfig = serde_json::from_str(data).context("parsing LLM config")?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                "openrouter" => env::var("OPENROUTER_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENROUTER_API_KEY env var"))?,
                other => bail!("Unsupported provider in config: {other}"),
            };
        }

        if !(0.0..=2.0).contains(&cfg.temperature) {
            cfg.temperature = default_temperature();
        }
        if cfg.max_tokens == 0 {
            cfg.max_tokens = default_max_tokens();
        }

        Ok(cfg)
    }

    /// Chat-completions endpoint for the configured provider.
    pub fn chat_completions_url(&self) -> String {
        let base = match (&self.base_url, self.provider.as_str()) {
            (Some(b), _) => b.trim_end_matches('/').to_string(),
            (None, "openrouter") => "https://openrouter.ai/api/v1".to_string(),
            (None, _) => "https://api.openai.com/v1".to_string(),
        };
        format!("{base}/chat/completions")
    }
}
