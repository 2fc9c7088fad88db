//! Turn raw model text into typed values.
//!
//! Models sometimes wrap JSON in markdown fences; those are stripped before parsing.
//! Anything that does not match the expected shape is a `DecodeError`, never a panic.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::model::{CrossUrlConnection, Entity, QuickMetadata, Sentiment, UrlAnalysis};

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````.
pub fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse `text` as a JSON object and reject agent-reported failures (`{"error": ...}`).
pub fn decode_object(text: &str) -> Result<Map<String, Value>, DecodeError> {
    let value: Value = serde_json::from_str(strip_code_fences(text))?;
    let obj = match value {
        Value::Object(m) => m,
        other => return Err(DecodeError::NotAnObject(json_type_name(&other))),
    };
    // only a truthy `error` counts: "", 0, false and null are ignored
    match obj.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(obj),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(obj),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Ok(obj),
        Some(Value::String(s)) => Err(DecodeError::AgentReported(s.clone())),
        Some(other) => Err(DecodeError::AgentReported(other.to_string())),
    }
}

fn clean(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_list(v: Option<Vec<String>>) -> Vec<String> {
    v.unwrap_or_default()
        .into_iter()
        .filter_map(|s| clean(Some(s)))
        .collect()
}

pub fn decode_quick_metadata(text: &str) -> Result<QuickMetadata, DecodeError> {
    let obj = decode_object(text)?;
    let raw: QuickMetadata = serde_json::from_value(Value::Object(obj))?;
    let topics = clean_list(raw.suggested_topics);
    Ok(QuickMetadata {
        title: clean(raw.title),
        emoji: clean(raw.emoji),
        description: clean(raw.description),
        suggested_topics: (!topics.is_empty()).then_some(topics),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUrlAnalysis {
    title: Option<String>,
    description: Option<String>,
    topics: Option<Vec<String>>,
    sentiment: Option<String>,
    summary: Option<String>,
    insights: Option<Vec<String>>,
    entities: Option<Vec<Entity>>,
    reading_time: Option<f64>,
    confidence: Option<f64>,
    related_urls: Option<Vec<String>>,
    emoji: Option<String>,
}

/// Decode one per-URL analysis. `url` is always the analyzed URL, whatever the model echoed.
/// `fallback_reading_time` fills a missing `readingTime`.
pub fn decode_url_analysis(
    text: &str,
    url: &str,
    fallback_reading_time: f64,
) -> Result<UrlAnalysis, DecodeError> {
    let obj = decode_object(text)?;
    let raw: RawUrlAnalysis = serde_json::from_value(Value::Object(obj))?;

    let summary =
        clean(raw.summary).ok_or_else(|| DecodeError::invalid("summary", "missing or empty"))?;

    let sentiment: Sentiment = match raw.sentiment {
        Some(s) => s.parse().map_err(|e: String| DecodeError::invalid("sentiment", e))?,
        None => return Err(DecodeError::invalid("sentiment", "missing")),
    };

    let confidence = raw
        .confidence
        .ok_or_else(|| DecodeError::invalid("confidence", "missing"))?;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(DecodeError::invalid(
            "confidence",
            format!("{confidence} is outside 0..1"),
        ));
    }

    let reading_time = raw.reading_time.unwrap_or(fallback_reading_time);
    if !reading_time.is_finite() || reading_time < 0.0 {
        return Err(DecodeError::invalid(
            "readingTime",
            format!("{reading_time} is not a non-negative number"),
        ));
    }

    let entities = raw
        .entities
        .unwrap_or_default()
        .into_iter()
        .map(|e| Entity::new(e.kind.trim(), e.value.trim()))
        .filter(|e| !e.kind.is_empty() && !e.value.is_empty())
        .collect();

    let related = clean_list(raw.related_urls);

    Ok(UrlAnalysis {
        url: url.to_string(),
        title: clean(raw.title),
        description: clean(raw.description),
        topics: clean_list(raw.topics),
        sentiment,
        summary,
        insights: clean_list(raw.insights),
        entities,
        reading_time,
        confidence,
        related_urls: (!related.is_empty()).then_some(related),
        emoji: clean(raw.emoji),
    })
}

/// Narrative part of the combiner's answer. Merged lists are computed in code.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinerOutput {
    pub title: Option<String>,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub full_description: String,
    pub enhanced_insights: Option<Vec<String>>,
    pub cross_url_connections: Option<Vec<CrossUrlConnection>>,
}

#[derive(Deserialize)]
struct RawConnection {
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    connection: String,
    strength: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCombined {
    title: Option<String>,
    emoji: Option<String>,
    description: Option<String>,
    full_description: Option<String>,
    enhanced_insights: Option<Vec<String>>,
    cross_url_connections: Option<Vec<RawConnection>>,
}

/// Strength used when the model omits one.
const DEFAULT_STRENGTH: f64 = 0.5;

pub fn decode_combined(text: &str) -> Result<CombinerOutput, DecodeError> {
    let obj = decode_object(text)?;
    let raw: RawCombined = serde_json::from_value(Value::Object(obj))?;

    let full_description = clean(raw.full_description)
        .ok_or_else(|| DecodeError::invalid("fullDescription", "missing or empty"))?;

    let connections = raw.cross_url_connections.map(|list| {
        list.into_iter()
            .map(|c| CrossUrlConnection {
                urls: clean_list(Some(c.urls)),
                connection: c.connection.trim().to_string(),
                strength: c
                    .strength
                    .filter(|s| s.is_finite())
                    .unwrap_or(DEFAULT_STRENGTH)
                    .clamp(0.0, 1.0),
            })
            .collect()
    });

    Ok(CombinerOutput {
        title: clean(raw.title),
        emoji: clean(raw.emoji),
        description: clean(raw.description),
        full_description,
        enhanced_insights: raw.enhanced_insights.map(|v| clean_list(Some(v))),
        cross_url_connections: connections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS: &str = r#"{"topics":["rust"],"sentiment":"Positive","summary":"S.","insights":[" a ",""],"entities":[{"type":"org","value":"Mozilla"}],"readingTime":3,"confidence":0.9,"url":"https://elsewhere.test"}"#;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  {} "), "{}");
    }

    #[test]
    fn fenced_analysis_decodes_like_bare_json() {
        let fenced = format!("```json\n{ANALYSIS}\n```");
        let a = decode_url_analysis(&fenced, "https://a.test", 0.0).unwrap();
        let b = decode_url_analysis(ANALYSIS, "https://a.test", 0.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.url, "https://a.test");
        assert_eq!(a.sentiment, Sentiment::Positive);
        assert_eq!(a.insights, vec!["a".to_string()]);
        assert_eq!(a.entities[0].key(), "org:Mozilla");
    }

    #[test]
    fn agent_error_field_is_a_failure() {
        let err = decode_url_analysis(r#"{"error":"paywall"}"#, "https://a.test", 0.0).unwrap_err();
        assert!(matches!(err, DecodeError::AgentReported(ref s) if s == "paywall"));

        let flagged = decode_object(r#"{"error":true}"#).unwrap_err();
        assert!(matches!(flagged, DecodeError::AgentReported(ref s) if s == "true"));
    }

    #[test]
    fn falsy_error_field_is_ignored() {
        for falsy in [r#""""#, "0", "false", "null"] {
            let text = ANALYSIS.replacen('{', &format!(r#"{{"error":{falsy},"#), 1);
            let a = decode_url_analysis(&text, "https://a.test", 0.0)
                .unwrap_or_else(|e| panic!("error={falsy}: {e}"));
            assert_eq!(a.summary, "S.");
        }
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let text = ANALYSIS.replace("0.9", "1.5");
        let err = decode_url_analysis(&text, "https://a.test", 0.0).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid { field: "confidence", .. }));
    }

    #[test]
    fn unknown_sentiment_and_missing_summary_are_rejected() {
        let bad = ANALYSIS.replace("Positive", "ecstatic");
        assert!(decode_url_analysis(&bad, "u", 0.0).is_err());
        let no_summary = ANALYSIS.replace(r#""summary":"S.","#, "");
        let err = decode_url_analysis(&no_summary, "u", 0.0).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid { field: "summary", .. }));
    }

    #[test]
    fn missing_reading_time_uses_fallback() {
        let text = ANALYSIS.replace(r#""readingTime":3,"#, "");
        let a = decode_url_analysis(&text, "u", 2.0).unwrap();
        assert_eq!(a.reading_time, 2.0);
    }

    #[test]
    fn non_object_and_prose_are_rejected() {
        assert!(matches!(
            decode_object("[1,2]").unwrap_err(),
            DecodeError::NotAnObject("array")
        ));
        assert!(matches!(
            decode_object("Sure! Here is the JSON").unwrap_err(),
            DecodeError::Json(_)
        ));
    }

    #[test]
    fn quick_metadata_blank_fields_become_none() {
        let m = decode_quick_metadata(r#"{"title":"  ","emoji":"📚","suggestedTopics":[]}"#).unwrap();
        assert_eq!(m.title, None);
        assert_eq!(m.emoji.as_deref(), Some("📚"));
        assert_eq!(m.suggested_topics, None);
    }

    #[test]
    fn combined_requires_full_description_and_clamps_strength() {
        assert!(decode_combined(r#"{"title":"x"}"#).is_err());
        let out = decode_combined(
            r#"{"fullDescription":"Long.","crossUrlConnections":[{"urls":["a","b"],"connection":"same topic","strength":3}]}"#,
        )
        .unwrap();
        assert_eq!(out.full_description, "Long.");
        assert_eq!(out.cross_url_connections.unwrap()[0].strength, 1.0);
    }
}
