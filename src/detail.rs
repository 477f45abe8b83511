//! Read-only detail of a selected product.

use crate::product::ProductRecord;

/// Shown when a product has no description.
pub const NO_DESCRIPTION: &str = "No description.";

/// Presentation data for the detail modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    pub title: String,
    pub code: String,
    pub reference: Option<String>,
    pub image_url: String,
    pub price: String,
    pub description: String,
}

impl From<&ProductRecord> for ProductDetail {
    fn from(product: &ProductRecord) -> Self {
        Self {
            title: product.name.clone(),
            code: product.code.clone(),
            reference: product.reference.clone().filter(|r| !r.is_empty()),
            image_url: product.image_url.clone(),
            price: product.formatted_price(),
            description: product
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        }
    }
}
