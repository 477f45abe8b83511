//! Product records as the catalog backend returns them.
//!
//! Records are deliberately loose: every field may be absent on the wire,
//! scalars may arrive as numbers instead of strings, and the backend still
//! emits its legacy Portuguese field names on some endpoints. The canonical
//! in-memory shape is always [`ProductRecord`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalog entry.
///
/// `code` is the identity key used across the whole pipeline. `price` is
/// kept exactly as received and only parsed for sorting and formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(alias = "codigo")]
    pub code: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "referencia", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(alias = "imagem", alias = "image_url")]
    pub image_url: String,
    #[serde(alias = "preco")]
    pub price: String,
    #[serde(alias = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

const CODE_KEYS: &[&str] = &["code", "codigo"];
const NAME_KEYS: &[&str] = &["name", "nome"];
const REFERENCE_KEYS: &[&str] = &["reference", "referencia"];
const IMAGE_KEYS: &[&str] = &["imageUrl", "image_url", "imagem"];
const PRICE_KEYS: &[&str] = &["price", "preco"];
const DESCRIPTION_KEYS: &[&str] = &["description", "descricao"];

impl ProductRecord {
    /// Build a record from an arbitrary JSON value without ever failing.
    ///
    /// Objects are read field by field (first matching key wins). Anything
    /// else yields a default record so that positional count is preserved.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            code: lookup(map, CODE_KEYS).unwrap_or_default(),
            name: lookup(map, NAME_KEYS).unwrap_or_default(),
            reference: lookup(map, REFERENCE_KEYS),
            image_url: lookup(map, IMAGE_KEYS).unwrap_or_default(),
            price: lookup(map, PRICE_KEYS).unwrap_or_default(),
            description: lookup(map, DESCRIPTION_KEYS),
        }
    }

    /// Numeric price, or `None` when the string is empty, unparseable or
    /// not finite.
    pub fn price_value(&self) -> Option<f64> {
        parse_price(&self.price)
    }

    /// Price formatted as Brazilian reais (`R$ 1.234,56`). Unparseable
    /// prices are returned verbatim.
    pub fn formatted_price(&self) -> String {
        match self.price_value() {
            Some(value) => format_brl(value),
            None => self.price.clone(),
        }
    }

    /// Title-cased name as shown on a product card: first character upper,
    /// the rest lower.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }

    /// Rendering key for position `index`. Includes the index so duplicate
    /// codes never collide.
    pub fn render_key(&self, index: usize) -> String {
        let code = if self.code.is_empty() { "item" } else { &self.code };
        format!("{}-{}", code, index)
    }
}

fn lookup(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(scalar_to_string)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a decimal-as-string price.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a value as pt-BR currency: `R$`, a no-break space, `.` thousands
/// separators and a `,` decimal separator with two places.
pub fn format_brl(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}R$\u{a0}{},{}", sign, grouped, frac_part)
}
