// src/fetch/extract.rs
//! Best-effort title/description heuristics over extracted page text.
//!
//! The extraction service returns Markdown-ish plain text, sometimes with a
//! `Title:` header block, sometimes raw HTML. Absence is never an error.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+(.+?)(?:\s+#+)?\s*$").expect("heading regex"));
static RE_TITLE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*title:\s*(.+?)\s*$").expect("title label regex"));
static RE_TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("title tag regex"));
static RE_DESC_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*description:\s*(.+?)\s*$").expect("description label regex")
});
static RE_META_DESC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\s[^>]*name\s*=\s*["']description["'][^>]*content\s*=\s*["']([^"']*)["']"#)
        .expect("meta description regex")
});
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Title, in order of preference:
/// 1) first non-empty line as a Markdown heading
/// 2) a `Title:` labeled line
/// 3) an HTML `<title>` tag
pub fn extract_title(content: &str) -> Option<String> {
    let first_line = content.lines().map(str::trim).find(|l| !l.is_empty())?;

    if let Some(caps) = RE_HEADING.captures(first_line) {
        if let Some(t) = caps.get(1).and_then(|m| clean_inline(m.as_str())) {
            return Some(t);
        }
    }

    if let Some(t) = RE_TITLE_LABEL
        .captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_inline(m.as_str()))
    {
        return Some(t);
    }

    RE_TITLE_TAG
        .captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_inline(m.as_str()))
}

/// Longer-form description from a `description:` line or `<meta name="description">`.
pub fn extract_description(content: &str) -> Option<String> {
    if let Some(d) = RE_DESC_LABEL
        .captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_inline(m.as_str()))
    {
        return Some(d);
    }
    RE_META_DESC
        .captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_inline(m.as_str()))
}

/// Decode entities, strip tags, collapse whitespace. `None` if nothing is left.
fn clean_inline(s: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(s).to_string();
    let stripped = RE_TAGS.replace_all(&decoded, "");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    let out = collapsed.trim();
    if out.is_empty() {
        None
    } else {
        Some(out.to_string())
    }
}

/// First `max_chars` characters of `s` (char-boundary safe).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_heading_wins() {
        assert_eq!(extract_title("# Title\nBody"), Some("Title".to_string()));
        assert_eq!(
            extract_title("\n\n## Release notes ##\nTitle: Other"),
            Some("Release notes".to_string())
        );
    }

    #[test]
    fn hash_inside_a_word_is_part_of_the_title() {
        assert_eq!(extract_title("# Learn C#\nBody"), Some("Learn C#".to_string()));
        assert_eq!(extract_title("# F#"), Some("F#".to_string()));
        assert_eq!(extract_title("### C# tips ###"), Some("C# tips".to_string()));
    }

    #[test]
    fn heading_later_in_text_is_not_a_title() {
        assert_eq!(extract_title("Intro text\n# Section"), None);
    }

    #[test]
    fn title_label_then_title_tag() {
        let reader = "Title: Rust 1.80 released\n\nURL Source: https://blog.test\n\nMarkdown Content:\n...";
        assert_eq!(extract_title(reader), Some("Rust 1.80 released".to_string()));

        let html = "<html><head><title> Acme &amp; Co\n Home </title></head></html>";
        assert_eq!(extract_title(html), Some("Acme & Co Home".to_string()));
    }

    #[test]
    fn description_from_label_or_meta() {
        let text = "# T\nDescription: A short page about crabs.\nBody";
        assert_eq!(
            extract_description(text),
            Some("A short page about crabs.".to_string())
        );

        let html = r#"<head><meta name="description" content="Tools &amp; guides"></head>"#;
        assert_eq!(extract_description(html), Some("Tools & guides".to_string()));

        assert_eq!(extract_description("# T\nnothing here"), None);
    }

    #[test]
    fn extraction_is_deterministic() {
        let page = "# Stable\nDescription: same\nBody";
        assert_eq!(extract_title(page), extract_title(page));
        assert_eq!(extract_description(page), extract_description(page));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
