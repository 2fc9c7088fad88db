// src/config/pipeline.rs
//! Deadlines, concurrency and truncation limits for one workflow run.
//!
//! TOML shape (every key optional):
//! ```toml
//! fetch_timeout_ms = 20000
//! llm_timeout_ms = 60000
//! run_timeout_ms = 180000
//! max_concurrency = 0      # 0 = all URLs in flight at once
//! max_content_chars = 24000
//! insights_limit = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const ENV_MAX_CONCURRENCY: &str = "PIPELINE_MAX_CONCURRENCY";
pub const ENV_RUN_TIMEOUT_MS: &str = "PIPELINE_RUN_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch_timeout_ms: u64,
    pub llm_timeout_ms: u64,
    pub run_timeout_ms: u64,
    pub max_concurrency: usize,
    pub max_content_chars: usize,
    pub insights_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 20_000,
            llm_timeout_ms: 60_000,
            run_timeout_ms: 180_000,
            max_concurrency: 0,
            max_content_chars: 24_000,
            insights_limit: 10,
        }
    }
}

impl PipelineConfig {
    /// Load using env var + fallback:
    /// 1) $PIPELINE_CONFIG_PATH (must exist)
    /// 2) config/pipeline.toml
    /// 3) defaults
    ///
    /// Then apply `PIPELINE_MAX_CONCURRENCY` / `PIPELINE_RUN_TIMEOUT_MS`.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_PIPELINE_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_PIPELINE_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(s).context("parsing pipeline config")?;
        Ok(cfg.sanitized())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(n) = parse_env::<usize>(ENV_MAX_CONCURRENCY) {
            self.max_concurrency = n;
        }
        if let Some(ms) = parse_env::<u64>(ENV_RUN_TIMEOUT_MS) {
            self.run_timeout_ms = ms;
        }
        *self = self.clone().sanitized();
    }

    // zero deadlines or limits are treated as unset
    pub(crate) fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.fetch_timeout_ms == 0 {
            self.fetch_timeout_ms = d.fetch_timeout_ms;
        }
        if self.llm_timeout_ms == 0 {
            self.llm_timeout_ms = d.llm_timeout_ms;
        }
        if self.run_timeout_ms == 0 {
            self.run_timeout_ms = d.run_timeout_ms;
        }
        if self.max_content_chars == 0 {
            self.max_content_chars = d.max_content_chars;
        }
        if self.insights_limit == 0 {
            self.insights_limit = d.insights_limit;
        }
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    /// In-flight limit for a step over `n` items (always at least 1).
    pub fn concurrency_for(&self, n: usize) -> usize {
        let n = n.max(1);
        if self.max_concurrency == 0 {
            n
        } else {
            self.max_concurrency.min(n)
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}
