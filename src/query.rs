//! Query normalization and request-shape classification.
//!
//! Raw text typed by the user is normalized (diacritics stripped,
//! whitespace collapsed, lowercased) and then classified as a list-all, a
//! product-code lookup or a product-name search. The classification is a
//! heuristic and is reproduced exactly: any query containing whitespace is
//! a name search even when it is mostly digits.

use serde_json::{json, Value};
use unicode_normalization::UnicodeNormalization;

/// Default path of the product listing endpoint.
pub const LIST_PATH: &str = "/products/list";

/// Normalize raw query text.
///
/// NFD decomposition, removal of combining diacritical marks
/// (U+0300..=U+036F), whitespace runs collapsed to one space, trimmed and
/// lowercased.
pub fn normalize_query(raw: &str) -> String {
    let stripped: String = raw
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect();
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether `query` should be sent as a product-code filter.
///
/// True when the query is all ASCII digits, or when it contains at least
/// one digit and no whitespace.
pub fn is_code_query(query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    let all_digits = query.chars().all(|c| c.is_ascii_digit());
    let has_digit = query.chars().any(|c| c.is_ascii_digit());
    let has_space = query.chars().any(char::is_whitespace);
    all_digits || (has_digit && !has_space)
}

/// The effective request for a normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductQuery {
    ListAll,
    Code(String),
    Name(String),
}

impl ProductQuery {
    /// Classify an already-normalized query.
    pub fn classify(normalized: &str) -> Self {
        if normalized.is_empty() {
            ProductQuery::ListAll
        } else if is_code_query(normalized) {
            ProductQuery::Code(normalized.to_string())
        } else {
            ProductQuery::Name(normalized.to_string())
        }
    }

    /// Normalize raw text and classify it.
    pub fn from_raw(raw: &str) -> Self {
        Self::classify(&normalize_query(raw))
    }

    /// The normalized text this query was built from (empty for list-all).
    pub fn text(&self) -> &str {
        match self {
            ProductQuery::ListAll => "",
            ProductQuery::Code(q) | ProductQuery::Name(q) => q,
        }
    }

    /// Build the wire request against `path`.
    pub fn request(&self, path: &str) -> ProductRequest {
        match self {
            ProductQuery::ListAll => ProductRequest::Get {
                path: path.to_string(),
            },
            ProductQuery::Code(code) => ProductRequest::Post {
                path: path.to_string(),
                body: json!({ "productCode": code }),
            },
            ProductQuery::Name(name) => ProductRequest::Post {
                path: path.to_string(),
                body: json!({ "productName": name }),
            },
        }
    }
}

/// A request as the transport sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductRequest {
    Get { path: String },
    Post { path: String, body: Value },
}

impl ProductRequest {
    pub fn path(&self) -> &str {
        match self {
            ProductRequest::Get { path } | ProductRequest::Post { path, .. } => path,
        }
    }
}
