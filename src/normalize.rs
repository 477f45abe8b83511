//! Normalizer: turns whatever the backend returned into the canonical list.

use serde_json::Value;

use crate::product::ProductRecord;

/// Keys probed, in order, for a wrapped product array.
pub const ENVELOPE_KEYS: &[&str] = &["data", "items", "result", "resultado"];

/// Convert an arbitrary payload into an ordered product list.
///
/// Resolution order: a bare array; an array under one of
/// [`ENVELOPE_KEYS`]; a single object (wrapped as one record); otherwise
/// empty. Entries are never dropped.
pub fn normalize_payload(payload: &Value) -> Vec<ProductRecord> {
    records_of(payload)
        .map(|entries| entries.iter().map(ProductRecord::from_value).collect())
        .unwrap_or_else(|| match payload {
            Value::Object(_) => vec![ProductRecord::from_value(payload)],
            _ => Vec::new(),
        })
}

fn records_of(payload: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(entries) = payload {
        return Some(entries);
    }
    ENVELOPE_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array))
}
