// src/fetch/providers/scraper.rs
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::error::FetchError;
use crate::fetch::extract::truncate_chars;
use crate::fetch::types::ContentFetcher;

/// Reader-style extraction service: `GET {base}/{url}` returns the page as plain text.
pub struct ScraperFetcher {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ScraperFetcher {
    /// `timeout` bounds the whole request; the pipeline applies its own deadline on top.
    pub fn new(cfg: &ScraperConfig, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("webs-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building scraper http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    pub fn endpoint_for(&self, url: &str) -> String {
        format!("{}/{}", self.base_url, url.trim())
    }
}

#[async_trait]
impl ContentFetcher for ScraperFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut req = self
            .http
            .get(self.endpoint_for(url))
            .header(ACCEPT, "text/plain");
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), 200).to_string(),
            });
        }

        resp.text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "scraper"
    }
}
