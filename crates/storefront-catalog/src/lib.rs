//! Catalog domain types for the Wicked Works storefront.
//!
//! - **Ids**: newtype identifiers for collections, products and images
//! - **Money**: exact minor-unit prices parsed from `MoneyV2`
//! - **Model**: `Collection`, `RecommendedProduct`, `Image`
//! - **Queries**: the home page GraphQL documents and their decoders

pub mod ids;
pub mod model;
pub mod money;
pub mod queries;

pub use ids::*;
pub use model::{Collection, Image, RecommendedProduct};
pub use money::{Currency, Money, MoneyError};
pub use queries::{
    decode_collections, decode_recommended_products, ALL_COLLECTIONS, RECOMMENDED_PRODUCTS,
};
