//! Tolerant RSS/Atom item extraction
//!
//! Feeds in the wild are frequently malformed, so items are extracted one at
//! a time instead of parsing the document as a whole. The document is split
//! at every `<item>` / `<entry>` opening tag and each segment is parsed on its
//! own: a segment without its closing tag, title or link is dropped and the
//! rest of the feed is kept.
//!
//! Within an item the first occurrence of each field tag wins, CDATA is
//! unwrapped and entities are decoded. Attribute-embedded CDATA and
//! namespaces other than `dc:` / `content:` are not interpreted.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::text::{decode_entities, strip_html};

/// One extracted feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub summary: String,
    /// RFC 3339 when the upstream date was parsable, otherwise as published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// Result of extracting a whole document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    /// Channel/feed title, if present before the first item
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
    /// Entries dropped because they were malformed or incomplete
    pub skipped: usize,
}

static ITEM_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(item|entry)(?:\s[^>]*)?>").expect("valid regex"));

static ITEM_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</item\s*>").expect("valid regex"));

static ENTRY_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</entry\s*>").expect("valid regex"));

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid regex"));

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link\b([^>]*)>").expect("valid regex"));

static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

static REL_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\brel\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

static TERM_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<category\b[^>]*\bterm\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});

static AUTHOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<author(?:\s[^>]*)?>.*?<name(?:\s[^>]*)?>(.*?)</name\s*>").expect("valid regex")
});

const FIELD_TAGS: &[&str] = &[
    "title",
    "link",
    "guid",
    "description",
    "summary",
    "content:encoded",
    "content",
    "pubDate",
    "published",
    "updated",
    "dc:date",
    "dc:creator",
    "category",
];

/// `<tag ...>text</tag>` patterns for every field we read
static FIELD_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    FIELD_TAGS
        .iter()
        .map(|tag| {
            let name = regex::escape(tag);
            let pattern = format!(r"(?is)<{name}(?:\s[^>]*)?>(.*?)</{name}\s*>");
            (*tag, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

/// Extract every well-formed item from an RSS or Atom document
pub fn parse_feed(xml: &str) -> ParsedFeed {
    let openings: Vec<(usize, usize, bool)> = ITEM_OPEN
        .captures_iter(xml)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let is_entry = caps.get(1)?.as_str().eq_ignore_ascii_case("entry");
            Some((whole.start(), whole.end(), is_entry))
        })
        .collect();

    let header_end = openings.first().map(|(start, _, _)| *start).unwrap_or(xml.len());
    let title = first_field(&xml[..header_end], &["title"]).map(|t| clean_text(&t));

    let mut parsed = ParsedFeed {
        title,
        items: Vec::with_capacity(openings.len()),
        skipped: 0,
    };

    for (i, (_, body_start, is_entry)) in openings.iter().enumerate() {
        let segment_end = openings
            .get(i + 1)
            .map(|(start, _, _)| *start)
            .unwrap_or(xml.len());
        let segment = &xml[*body_start..segment_end];

        let close = if *is_entry { &ENTRY_CLOSE } else { &ITEM_CLOSE };
        let Some(close_match) = close.find(segment) else {
            debug!("Skipping feed item {}: missing closing tag", i);
            parsed.skipped += 1;
            continue;
        };

        match parse_item(&segment[..close_match.start()]) {
            Some(item) => parsed.items.push(item),
            None => {
                debug!("Skipping feed item {}: missing title or link", i);
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

fn parse_item(body: &str) -> Option<FeedItem> {
    let title = first_field(body, &["title"])
        .map(|t| clean_text(&t))
        .filter(|t| !t.is_empty())?;

    let link = extract_link(body)?;

    let summary = first_field(body, &["description", "summary", "content:encoded", "content"])
        .map(|s| clean_text(&s))
        .unwrap_or_default();

    let published = first_field(body, &["pubDate", "published", "updated", "dc:date"])
        .map(|d| normalize_date(&clean_text(&d)));

    let mut authors: Vec<String> = AUTHOR_NAME
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .filter(|name| !name.is_empty())
        .collect();
    if authors.is_empty() {
        if let Some(creator) = first_field(body, &["dc:creator"]) {
            authors.push(clean_text(&creator));
        }
    }

    let mut categories: Vec<String> = FIELD_PATTERNS["category"]
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .filter(|c| !c.is_empty())
        .collect();
    categories.extend(
        TERM_ATTR
            .captures_iter(body)
            .filter_map(|caps| caps.get(1).map(|m| decode_entities(m.as_str()))),
    );

    Some(FeedItem {
        title,
        link,
        summary,
        published,
        authors,
        categories,
    })
}

/// RSS `<link>url</link>`, else Atom `<link href>` preferring `rel="alternate"`,
/// else a permalink `<guid>`
fn extract_link(body: &str) -> Option<String> {
    if let Some(text) = first_field(body, &["link"]) {
        let text = clean_text(&text);
        if !text.is_empty() {
            return Some(text);
        }
    }

    let mut fallback = None;
    for caps in LINK_TAG.captures_iter(body) {
        let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(href) = HREF_ATTR.captures(attrs).and_then(|c| c.get(1)) else {
            continue;
        };
        let href = decode_entities(href.as_str());
        let rel = REL_ATTR
            .captures(attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase());
        match rel.as_deref() {
            None | Some("alternate") => return Some(href),
            _ => {
                fallback.get_or_insert(href);
            }
        }
    }
    if fallback.is_some() {
        return fallback;
    }

    first_field(body, &["guid"])
        .map(|g| clean_text(&g))
        .filter(|g| g.starts_with("http"))
}

/// First match among `tags`, tried in preference order
fn first_field(body: &str, tags: &[&str]) -> Option<String> {
    tags.iter().find_map(|tag| {
        FIELD_PATTERNS
            .get(tag)?
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Unwrap CDATA, decode entities, then strip markup (descriptions often
/// carry escaped HTML)
fn clean_text(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    strip_html(&decode_entities(&unwrapped))
}

fn normalize_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|d| d.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss_item(n: usize) -> String {
        format!(
            "<item><title>Story {n}</title><link>https://example.com/{n}</link>\
             <description>Body {n}</description></item>"
        )
    }

    #[test]
    fn test_parses_rss_items() {
        let xml = format!(
            "<rss><channel><title>Example Feed</title>{}{}</channel></rss>",
            rss_item(1),
            rss_item(2)
        );
        let feed = parse_feed(&xml);
        assert_eq!(feed.title.as_deref(), Some("Example Feed"));
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].title, "Story 1");
        assert_eq!(feed.items[1].link, "https://example.com/2");
        assert_eq!(feed.skipped, 0);
    }

    #[test]
    fn test_item_missing_closing_tag_is_skipped_alone() {
        let broken = "<item><title>Broken</title><link>https://example.com/broken</link>";
        let xml = format!(
            "<rss><channel>{}{}{}{}</channel></rss>",
            rss_item(1),
            broken,
            rss_item(2),
            rss_item(3)
        );
        let feed = parse_feed(&xml);
        assert_eq!(feed.items.len(), 3);
        assert_eq!(feed.skipped, 1);
        assert!(feed.items.iter().all(|i| i.title != "Broken"));
        assert_eq!(feed.items[1].title, "Story 2");
    }

    #[test]
    fn test_last_item_missing_closing_tag() {
        let xml = format!(
            "<rss><channel>{}<item><title>Cut off</title><link>https://x</link></channel></rss>",
            rss_item(1)
        );
        let feed = parse_feed(&xml);
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.skipped, 1);
    }

    #[test]
    fn test_item_missing_title_close_is_skipped() {
        let xml = format!(
            "<rss><channel><item><title>No end<link>https://x</link></item>{}</channel></rss>",
            rss_item(1)
        );
        let feed = parse_feed(&xml);
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Story 1");
    }

    #[test]
    fn test_cdata_and_entities() {
        let xml = r#"<rss><channel><item>
            <title><![CDATA[Rates & <b>Bonds</b>]]></title>
            <link>https://example.com/a?x=1&amp;y=2</link>
            <description>&lt;p&gt;Fed holds&lt;/p&gt;</description>
            <pubDate>Tue, 10 Jun 2025 04:00:00 GMT</pubDate>
            <dc:creator>Jane Doe</dc:creator>
            <category>markets</category>
        </item></channel></rss>"#;
        let feed = parse_feed(xml);
        let item = &feed.items[0];
        assert_eq!(item.title, "Rates & Bonds");
        assert_eq!(item.link, "https://example.com/a?x=1&y=2");
        assert_eq!(item.summary, "Fed holds");
        assert_eq!(item.published.as_deref(), Some("2025-06-10T04:00:00+00:00"));
        assert_eq!(item.authors, vec!["Jane Doe".to_string()]);
        assert_eq!(item.categories, vec!["markets".to_string()]);
    }

    #[test]
    fn test_atom_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <title>ArXiv Query</title>
            <entry>
                <title>Attention Is Enough</title>
                <link rel="related" type="application/pdf" href="https://arxiv.org/pdf/1"/>
                <link rel="alternate" href="https://arxiv.org/abs/1"/>
                <summary>We show things.</summary>
                <published>2025-01-02T03:04:05Z</published>
                <author><name>A. Author</name></author>
                <author><name>B. Author</name></author>
                <category term="cs.AI"/>
            </entry>
        </feed>"#;
        let feed = parse_feed(xml);
        assert_eq!(feed.title.as_deref(), Some("ArXiv Query"));
        let entry = &feed.items[0];
        assert_eq!(entry.link, "https://arxiv.org/abs/1");
        assert_eq!(entry.authors.len(), 2);
        assert_eq!(entry.categories, vec!["cs.AI".to_string()]);
        assert_eq!(entry.published.as_deref(), Some("2025-01-02T03:04:05+00:00"));
    }

    #[test]
    fn test_unparsable_date_is_kept_raw() {
        let xml = "<rss><item><title>T</title><link>https://x</link><pubDate>yesterday</pubDate></item></rss>";
        let feed = parse_feed(xml);
        assert_eq!(feed.items[0].published.as_deref(), Some("yesterday"));
    }

    #[test]
    fn test_not_a_feed() {
        let feed = parse_feed("<html><body>Service unavailable</body></html>");
        assert!(feed.items.is_empty());
        assert_eq!(feed.skipped, 0);
    }
}
