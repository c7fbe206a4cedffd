//! Canonical payload shape
//!
//! A normalized payload is a field-name keyed mapping whose values are
//! scalars, records, or ordered lists of records. It is represented with
//! `serde_json` so heterogeneous upstream shapes can be merged uniformly.

use serde_json::{Map, Value};

/// Normalized data produced by a source
pub type Payload = Map<String, Value>;

/// Returns `true` for payloads that carry nothing usable:
/// JSON `null`, an empty array, or an empty object.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_payloads() {
        assert!(is_empty_payload(&Value::Null));
        assert!(is_empty_payload(&json!([])));
        assert!(is_empty_payload(&json!({})));
        assert!(!is_empty_payload(&json!({"a": 1})));
        assert!(!is_empty_payload(&json!(0)));
        assert!(!is_empty_payload(&json!("")));
    }
}
