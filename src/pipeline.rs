//! Pure derivation stages: favorites filter and sort.
//!
//! Both stages work on borrowed records and never touch the canonical list;
//! they return a new vector of references in the derived order.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::product::ProductRecord;

/// Keep only favorited records when `enabled`; identity otherwise.
///
/// Relative order of the input is preserved.
pub fn filter_favorites<'a>(
    list: &'a [ProductRecord],
    favorite_codes: &HashSet<String>,
    enabled: bool,
) -> Vec<&'a ProductRecord> {
    if !enabled {
        return list.iter().collect();
    }
    list.iter()
        .filter(|p| favorite_codes.contains(&p.code))
        .collect()
}

/// Selected ordering of the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[default]
    None,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::None => "",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sort key string that matched none of the known orderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key: {:?}", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    /// Accepts `name-asc`, `price-desc`, etc., the legacy `nome-*` /
    /// `preco-*` spellings, and `""` / `none` for the unsorted order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(SortKey::None),
            "name-asc" | "nome-asc" => Ok(SortKey::NameAsc),
            "name-desc" | "nome-desc" => Ok(SortKey::NameDesc),
            "price-asc" | "preco-asc" => Ok(SortKey::PriceAsc),
            "price-desc" | "preco-desc" => Ok(SortKey::PriceDesc),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Collation key for pt-BR comparison at base strength: accents and case
/// are ignored.
pub fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two names the way a pt-BR base-strength collator would.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Price ordering. Unparseable prices sort after every numeric price in
/// both directions.
fn compare_prices(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of `items` by `key`. Ties keep their input order.
pub fn sort_products<'a>(items: &[&'a ProductRecord], key: SortKey) -> Vec<&'a ProductRecord> {
    match key {
        SortKey::None => items.to_vec(),
        SortKey::NameAsc | SortKey::NameDesc => {
            let mut keyed: Vec<(String, &'a ProductRecord)> = items
                .iter()
                .map(|p| (collation_key(&p.name), *p))
                .collect();
            if key == SortKey::NameAsc {
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
            } else {
                keyed.sort_by(|a, b| b.0.cmp(&a.0));
            }
            keyed.into_iter().map(|(_, p)| p).collect()
        }
        SortKey::PriceAsc | SortKey::PriceDesc => {
            let descending = key == SortKey::PriceDesc;
            let mut keyed: Vec<(Option<f64>, &'a ProductRecord)> =
                items.iter().map(|p| (p.price_value(), *p)).collect();
            keyed.sort_by(|a, b| compare_prices(a.0, b.0, descending));
            keyed.into_iter().map(|(_, p)| p).collect()
        }
    }
}
