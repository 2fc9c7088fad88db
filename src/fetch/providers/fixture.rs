// src/fetch/providers/fixture.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::FetchError;
use crate::fetch::types::ContentFetcher;

#[derive(Debug, Clone)]
enum Fixture {
    Page(String),
    Status(u16, String),
}

/// In-memory fetcher keyed by URL. Unknown URLs answer `404`.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, Fixture>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Fixture::Page(content.into()));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.pages
            .insert(url.into(), Fixture::Status(status, body.into()));
        self
    }

    /// Delay the answer for `url` (simulates a slow upstream).
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// Number of `fetch_text` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for FixtureFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delays.get(url) {
            tokio::time::sleep(*d).await;
        }
        match self.pages.get(url) {
            Some(Fixture::Page(content)) => Ok(content.clone()),
            Some(Fixture::Status(status, body)) => Err(FetchError::Status {
                status: *status,
                body: body.clone(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                body: "no fixture".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
