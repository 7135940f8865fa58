//! Collection and product types consumed by the home page sections.

use crate::ids::{CollectionId, ImageId, ProductId};
use crate::money::Money;

/// Length at which collection descriptions are cut on cards.
pub const EXCERPT_CHARS: usize = 100;

/// A storefront image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: Option<ImageId>,
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    /// Alt text, falling back to `fallback` when missing or blank.
    pub fn alt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.alt_text.as_deref() {
            Some(alt) if !alt.trim().is_empty() => alt,
            _ => fallback,
        }
    }
}

/// A catalog collection shown as a category card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub handle: String,
    pub description: String,
    pub image: Option<Image>,
    /// Products returned by the one-product availability check; at most 1.
    pub product_count: usize,
}

impl Collection {
    /// Path of the collection page.
    pub fn url(&self) -> String {
        format!("/collections/{}", self.handle)
    }

    /// Description cut to `max_chars` characters with `...` appended when
    /// longer. `None` for an empty description.
    pub fn excerpt(&self, max_chars: usize) -> Option<String> {
        if self.description.is_empty() {
            return None;
        }
        if self.description.chars().count() <= max_chars {
            return Some(self.description.clone());
        }
        let cut: String = self.description.chars().take(max_chars).collect();
        Some(format!("{}...", cut))
    }

    /// Card footer label, e.g. "1 products".
    pub fn product_count_label(&self) -> String {
        format!("{} products", self.product_count)
    }
}

/// A product in the recommended grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedProduct {
    pub id: ProductId,
    pub title: String,
    pub handle: String,
    pub available_for_sale: bool,
    pub min_price: Money,
    pub featured_image: Option<Image>,
}

impl RecommendedProduct {
    /// Path of the product page.
    pub fn url(&self) -> String {
        format!("/products/{}", self.handle)
    }

    pub fn availability_label(&self) -> &'static str {
        if self.available_for_sale {
            "In Stock"
        } else {
            "Sold Out"
        }
    }
}
