// src/config/mod.rs
pub mod llm;
pub mod pipeline;

pub use llm::LlmConfig;
pub use pipeline::PipelineConfig;

use std::env;

pub const DEFAULT_SCRAPER_BASE_URL: &str = "https://r.jina.ai";

/// Content-extraction service settings (env only).
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCRAPER_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl ScraperConfig {
    /// `SCRAPER_BASE_URL` (default `https://r.jina.ai`) and optional `SCRAPER_API_KEY`.
    pub fn from_env() -> Self {
        let base_url = env::var("SCRAPER_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCRAPER_BASE_URL.to_string());
        let api_key = env::var("SCRAPER_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { base_url, api_key }
    }
}

/// Everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub scraper: ScraperConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            llm: LlmConfig::load()?,
            pipeline: PipelineConfig::load()?,
            scraper: ScraperConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn scraper_env_blank_values_fall_back() {
        env::set_var("SCRAPER_BASE_URL", "  ");
        env::set_var("SCRAPER_API_KEY", "");
        let cfg = ScraperConfig::from_env();
        assert_eq!(cfg, ScraperConfig::default());

        env::set_var("SCRAPER_BASE_URL", "http://localhost:3000");
        env::set_var("SCRAPER_API_KEY", "tok");
        let cfg = ScraperConfig::from_env();
        assert_eq!(cfg.base_url, "http://localhost:3000");
        assert_eq!(cfg.api_key.as_deref(), Some("tok"));

        env::remove_var("SCRAPER_BASE_URL");
        env::remove_var("SCRAPER_API_KEY");
    }
}
