// src/fetch/types.rs
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMetadata {
    /// Length of `content` in characters.
    pub content_length: usize,
    pub processing_time_ms: u64,
}

/// Outcome of fetching one URL. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub url: String,
    pub success: bool,
    /// Empty when `success == false`.
    pub content: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub error: Option<String>,
    pub metadata: FetchMetadata,
}

impl FetchResult {
    pub fn succeeded(url: impl Into<String>, content: String, processing_time_ms: u64) -> Self {
        let title = super::extract::extract_title(&content);
        let description = super::extract::extract_description(&content);
        Self {
            url: url.into(),
            success: true,
            metadata: FetchMetadata {
                content_length: content.chars().count(),
                processing_time_ms,
            },
            content,
            title,
            description,
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            url: url.into(),
            success: false,
            content: String::new(),
            title: None,
            description: None,
            error: Some(error.into()),
            metadata: FetchMetadata {
                content_length: 0,
                processing_time_ms,
            },
        }
    }
}

/// Source of page text for a URL. One attempt per call; no retries, no cache.
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}
