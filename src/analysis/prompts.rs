//! System prompts and user-message builders for the three agents.

use serde_json::json;

use crate::fetch::extract::truncate_chars;
use crate::fetch::FetchResult;
use crate::model::{QuickMetadata, UrlAnalysis};

/// Chars of page content shown to the quick-metadata agent per page.
const QUICK_EXCERPT_CHARS: usize = 800;

pub const QUICK_METADATA_SYSTEM: &str = "You label a batch of web pages quickly. \
Respond with ONLY a JSON object, no prose and no code fences:\n\
{\"title\": string, \"emoji\": string (exactly one emoji), \
\"description\": string (one or two sentences), \
\"suggestedTopics\": [string] (3 to 6 short topics)}.\n\
If a focus prompt is given, let it steer the title and topics.";

pub const URL_ANALYSIS_SYSTEM: &str = "You analyze the content of a single web page. \
Respond with ONLY a JSON object, no prose and no code fences:\n\
{\"title\": string, \"description\": string, \"topics\": [string], \
\"sentiment\": \"positive\" | \"neutral\" | \"negative\", \
\"summary\": string (3 to 5 sentences), \"insights\": [string], \
\"entities\": [{\"type\": string, \"value\": string}], \
\"readingTime\": number (minutes), \"confidence\": number (0 to 1), \
\"relatedUrls\": [string], \"emoji\": string}.\n\
If the content cannot be analyzed, respond with {\"error\": string} instead.";

pub const COMBINE_SYSTEM: &str = "You combine several per-page analyses into one overview. \
The merged topics, entities and sentiment are computed elsewhere; do not repeat them. \
Respond with ONLY a JSON object, no prose and no code fences:\n\
{\"title\": string, \"emoji\": string, \"description\": string, \
\"fullDescription\": string (several paragraphs covering every page), \
\"enhancedInsights\": [string] (insights that only appear when reading the pages together), \
\"crossUrlConnections\": [{\"urls\": [string], \"connection\": string, \"strength\": number (0 to 1)}]}.\n\
Only reference URLs that appear in the input.";

/// Batch-level view for the fast model: URLs, focus, and short excerpts of the fetched pages.
pub fn quick_metadata_user(
    urls: &[String],
    prompt: Option<&str>,
    fetches: &[FetchResult],
) -> String {
    let pages: Vec<_> = fetches
        .iter()
        .filter(|f| f.success)
        .map(|f| {
            json!({
                "url": f.url,
                "title": f.title,
                "description": f.description,
                "excerpt": truncate_chars(&f.content, QUICK_EXCERPT_CHARS),
            })
        })
        .collect();

    json!({
        "urls": urls,
        "focus": prompt,
        "successfulFetches": pages.len(),
        "pages": pages,
    })
    .to_string()
}

pub fn url_analysis_user(fetch: &FetchResult, prompt: Option<&str>, max_chars: usize) -> String {
    let mut out = format!("URL: {}\n", fetch.url);
    if let Some(t) = &fetch.title {
        out.push_str(&format!("Title: {t}\n"));
    }
    if let Some(d) = &fetch.description {
        out.push_str(&format!("Description: {d}\n"));
    }
    if let Some(p) = prompt {
        out.push_str(&format!("Focus: {p}\n"));
    }
    out.push_str("\nContent:\n");
    out.push_str(truncate_chars(&fetch.content, max_chars));
    out
}

pub fn combine_user(
    urls: &[String],
    prompt: Option<&str>,
    quick: &QuickMetadata,
    analyses: &[UrlAnalysis],
) -> String {
    json!({
        "urls": urls,
        "focus": prompt,
        "quickMetadata": quick,
        "urlAnalyses": analyses,
    })
    .to_string()
}
