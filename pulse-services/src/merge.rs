//! Deterministic merge of normalized payloads
//!
//! Payloads are folded left to right in contribution order:
//! - a key seen for the first time is copied as-is
//! - list + list: items whose identity is new are appended in order
//! - object + object: shallow merge, later fields overwrite earlier ones
//! - anything else: the first value wins

use std::collections::HashSet;

use serde_json::Value;

use pulse_core::Payload;

/// Fields consulted, in order, for an item's identity
pub const IDENTITY_FIELDS: &[&str] = &["title", "name", "full_name", "headline", "symbol", "id", "url"];

/// Identity of a list item for deduplication
///
/// Strings are compared trimmed and lowercased. Objects use the first
/// non-empty string or number among [`IDENTITY_FIELDS`]. Everything else
/// falls back to its compact JSON form. Each kind gets its own prefix so a
/// bare string never collides with an object or a number.
pub fn item_identity(item: &Value) -> String {
    match item {
        Value::String(s) => format!("s:{}", s.trim().to_lowercase()),
        Value::Object(fields) => IDENTITY_FIELDS
            .iter()
            .find_map(|field| match fields.get(*field)? {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_lowercase()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(|key| format!("o:{}", key))
            .unwrap_or_else(|| format!("j:{}", item)),
        other => format!("j:{}", other),
    }
}

/// Fold `payloads` into one mapping
pub fn merge_payloads<I>(payloads: I) -> Payload
where
    I: IntoIterator<Item = Payload>,
{
    let mut merged = Payload::new();
    for payload in payloads {
        merge_into(&mut merged, payload);
    }
    merged
}

fn merge_into(acc: &mut Payload, next: Payload) {
    for (key, value) in next {
        let Some(existing) = acc.get_mut(&key) else {
            acc.insert(key, value);
            continue;
        };

        match (existing, value) {
            (Value::Array(items), Value::Array(incoming)) => {
                let mut seen: HashSet<String> = items.iter().map(item_identity).collect();
                // `insert` also drops repeats inside the incoming list
                items.extend(incoming.into_iter().filter(|item| seen.insert(item_identity(item))));
            }
            (Value::Object(fields), Value::Object(incoming)) => {
                fields.extend(incoming);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_lists_dedup_in_first_seen_order() {
        let merged = merge_payloads([
            payload(json!({"tags": ["a", "b"]})),
            payload(json!({"tags": ["b", "c"]})),
        ]);
        assert_eq!(merged["tags"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_first_scalar_wins() {
        let merged = merge_payloads([
            payload(json!({"price": 100, "only_second": false})),
            payload(json!({"price": 200, "only_second": true})),
        ]);
        assert_eq!(merged["price"], 100);
        assert_eq!(merged["only_second"], false);
    }

    #[test]
    fn test_type_mismatch_keeps_first() {
        let merged = merge_payloads([
            payload(json!({"market": {"cap": 1}})),
            payload(json!({"market": [1, 2]})),
        ]);
        assert_eq!(merged["market"], json!({"cap": 1}));
    }

    #[test]
    fn test_records_shallow_merge_later_overwrites() {
        let merged = merge_payloads([
            payload(json!({"sentiment": {"value": 40, "label": "Fear"}})),
            payload(json!({"sentiment": {"value": 55, "source": "alt"}})),
        ]);
        assert_eq!(merged["sentiment"], json!({"value": 55, "label": "Fear", "source": "alt"}));
    }

    #[test]
    fn test_records_dedup_by_title_like_field() {
        let merged = merge_payloads([
            payload(json!({"headlines": [{"title": "ETF Approved", "url": "https://a.example/1"}]})),
            payload(json!({"headlines": [
                {"title": "  etf approved ", "url": "https://b.example/1"},
                {"title": "Rates Cut"},
                {"title": "rates cut"}
            ]})),
        ]);
        let titles: Vec<&str> = merged["headlines"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["ETF Approved", "Rates Cut"]);
    }

    #[test]
    fn test_first_list_is_copied_as_is() {
        let merged = merge_payloads([payload(json!({"tags": ["a", "a"]}))]);
        assert_eq!(merged["tags"], json!(["a", "a"]));
    }

    #[test]
    fn test_item_identity() {
        assert_eq!(item_identity(&json!(" Hello ")), "s:hello");
        assert_eq!(item_identity(&json!({"title": "", "name": "Bitcoin"})), "o:bitcoin");
        assert_eq!(item_identity(&json!({"id": 42})), "o:42");
        assert_eq!(item_identity(&json!({"score": 1})), r#"j:{"score":1}"#);
        assert_eq!(item_identity(&json!(7)), "j:7");
    }

    #[test]
    fn test_mixed_kinds_do_not_collide() {
        let merged = merge_payloads([
            payload(json!({"items": ["42", {"id": 42}]})),
            payload(json!({"items": [42, {"title": "42"}, "42"]})),
        ]);
        // Only the repeated bare string and the same-keyed object collapse
        assert_eq!(merged["items"], json!(["42", {"id": 42}, 42]));
    }
}
