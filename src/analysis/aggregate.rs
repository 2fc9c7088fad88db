//! Deterministic merging of per-URL analyses. No model involved.

use std::collections::{HashMap, HashSet};

use crate::model::{CrossUrlConnection, Entity, Sentiment, UrlAnalysis};

/// Keep the first occurrence of each string, preserving order.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Union of every analysis' topics, then suggested topics from quick metadata.
pub fn merge_topics(analyses: &[UrlAnalysis], suggested: Option<&[String]>) -> Vec<String> {
    let from_pages = analyses.iter().flat_map(|a| a.topics.iter().cloned());
    let from_quick = suggested.unwrap_or_default().iter().cloned();
    dedup_preserving_order(from_pages.chain(from_quick))
}

/// Entities deduplicated by `type:value`, first occurrence kept.
pub fn merge_entities(analyses: &[UrlAnalysis]) -> Vec<Entity> {
    let mut seen = HashSet::new();
    analyses
        .iter()
        .flat_map(|a| a.entities.iter())
        .filter(|e| seen.insert(e.key()))
        .cloned()
        .collect()
}

/// Majority vote; ties go to the sentiment that appeared first. Empty input is neutral.
pub fn majority_sentiment(analyses: &[UrlAnalysis]) -> Sentiment {
    let mut counts: HashMap<Sentiment, usize> = HashMap::new();
    let mut order: Vec<Sentiment> = Vec::new();
    for a in analyses {
        let c = counts.entry(a.sentiment).or_insert(0);
        if *c == 0 {
            order.push(a.sentiment);
        }
        *c += 1;
    }

    let mut best: Option<(Sentiment, usize)> = None;
    for s in order {
        let n = counts[&s];
        match best {
            Some((_, m)) if m >= n => {}
            _ => best = Some((s, n)),
        }
    }
    best.map(|(s, _)| s).unwrap_or_default()
}

/// Insights across pages, deduplicated, at most `limit`.
pub fn merge_insights(analyses: &[UrlAnalysis], limit: usize) -> Vec<String> {
    let mut out = dedup_preserving_order(analyses.iter().flat_map(|a| a.insights.iter().cloned()));
    out.truncate(limit);
    out
}

pub fn merge_related_urls(analyses: &[UrlAnalysis]) -> Vec<String> {
    dedup_preserving_order(
        analyses
            .iter()
            .filter_map(|a| a.related_urls.as_ref())
            .flat_map(|v| v.iter().cloned()),
    )
}

/// Keep connections that link at least two analyzed URLs and only mention analyzed URLs.
pub fn filter_connections(
    connections: Vec<CrossUrlConnection>,
    analyzed_urls: &[&str],
) -> Vec<CrossUrlConnection> {
    let known: HashSet<&str> = analyzed_urls.iter().copied().collect();
    connections
        .into_iter()
        .filter_map(|mut c| {
            c.urls = dedup_preserving_order(c.urls);
            let all_known = c.urls.iter().all(|u| known.contains(u.as_str()));
            (all_known && c.urls.len() >= 2 && !c.connection.is_empty()).then_some(c)
        })
        .collect()
}
