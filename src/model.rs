//! Request, per-URL and combined result shapes.
//!
//! Wire names are camelCase to match what the dashboard consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// One user submission. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub web_id: Option<String>,
}

impl AnalysisRequest {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            prompt: None,
            web_id: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_web_id(mut self, web_id: impl Into<String>) -> Self {
        self.web_id = Some(web_id.into());
        self
    }

    /// Prompt with surrounding whitespace removed; blank prompts count as absent.
    pub fn focus_prompt(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Non-empty list of absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.urls.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "at least one URL is required".into(),
            ));
        }
        for raw in &self.urls {
            let parsed = url::Url::parse(raw.trim()).map_err(|e| {
                PipelineError::InvalidRequest(format!("invalid URL `{raw}`: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(PipelineError::InvalidRequest(format!(
                    "unsupported URL scheme `{}` in `{raw}`",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// Batch-level summary from the fast model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::Neutral
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        };
        f.write_str(s)
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown sentiment `{other}`")),
        }
    }
}

/// Named thing mentioned by a page (person, organization, product, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Entity {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Composite `type:value` identity used for dedup.
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.value)
    }
}

/// Structured analysis of one successfully fetched URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlAnalysis {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub sentiment: Sentiment,
    pub summary: String,
    pub insights: Vec<String>,
    pub entities: Vec<Entity>,
    /// Estimated reading time in minutes.
    pub reading_time: f64,
    /// Model confidence in <0.0, 1.0>.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossUrlConnection {
    pub urls: Vec<String>,
    pub connection: String,
    pub strength: f64,
}

/// Where a dropped URL fell out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Fetch,
    Analysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// RFC 3339 UTC.
    pub timestamp: String,
    /// Number of URLs in the original request, not the successful subset.
    pub url_count: usize,
    pub processing_steps: Vec<String>,
    pub successful_count: usize,
    pub failed_count: usize,
    #[serde(default)]
    pub failed_urls: Vec<FailedUrl>,
}

/// Final artifact of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub full_description: String,
    pub topics: Vec<String>,
    pub sentiment: Sentiment,
    pub entities: Vec<Entity>,
    pub insights: Vec<String>,
    pub related_urls: Vec<String>,
    pub url_analyses: Vec<UrlAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_insights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_url_connections: Option<Vec<CrossUrlConnection>>,
    pub metadata: ResultMetadata,
}
