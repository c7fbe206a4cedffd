//! Text helpers shared by the adapters

use sha2::{Digest, Sha256};

/// Generate a stable item id from a URL
pub fn generate_id(prefix: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let result = hasher.finalize();
    format!("{}_{}", prefix, hex::encode(&result[..8]))
}

/// Decode XML/HTML entities, tolerating ones the XML unescaper rejects
pub fn decode_entities(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            // Last, so an escaped entity stays a literal entity
            .replace("&amp;", "&"),
    }
}

/// Strip HTML tags and collapse whitespace
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    decode_entities(&result)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max` characters, appending an ellipsis when cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

/// Short display name for the host of a URL ("www.coindesk.com" -> "coindesk")
pub fn host_label(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split('.').next().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        let html = "<p>Hello <b>world</b>!</p>";
        assert_eq!(strip_html(html), "Hello world!");
        assert_eq!(strip_html("Fish &amp; chips"), "Fish & chips");
    }

    #[test]
    fn test_decode_unknown_entity_falls_back() {
        assert_eq!(decode_entities("a&nbsp;b &amp; c"), "a b & c");
    }

    #[test]
    fn test_decode_fallback_decodes_once() {
        assert_eq!(decode_entities("&amp;lt;b&amp;gt;&nbsp;x"), "&lt;b&gt; x");
    }

    #[test]
    fn test_generate_id_is_stable() {
        let a = generate_id("rss", "https://example.com/a");
        let b = generate_id("rss", "https://example.com/a");
        let c = generate_id("rss", "https://example.com/b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("rss_"));
        assert_eq!(a.len(), "rss_".len() + 16);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
    }

    #[test]
    fn test_host_label() {
        assert_eq!(
            host_label("https://www.coindesk.com/markets/x"),
            Some("coindesk".to_string())
        );
        assert_eq!(host_label("not a url"), None);
    }
}
