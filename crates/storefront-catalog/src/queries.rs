//! Home page GraphQL documents and response decoding.

use edge_data::{decode, DependencyTag, GraphQlQuery, QueryError};
use serde::Deserialize;

use crate::ids::{CollectionId, ImageId, ProductId};
use crate::model::{Collection, Image, RecommendedProduct};
use crate::money::{Money, MoneyV2};

/// Upper bound on collections returned by `ALL_COLLECTIONS`.
pub const MAX_COLLECTIONS: usize = 10;

/// Upper bound on products returned by `RECOMMENDED_PRODUCTS`.
pub const MAX_RECOMMENDED: usize = 4;

/// Collections for the category cards, excluding example and home collections.
pub const ALL_COLLECTIONS: GraphQlQuery = GraphQlQuery::new(
    "AllCollections",
    r#"query AllCollections($country: CountryCode, $language: LanguageCode)
  @inContext(country: $country, language: $language) {
  collections(
    first: 10
    sortKey: TITLE
    query: "NOT title:*example* AND NOT title:*Home*"
  ) {
    nodes {
      id
      title
      handle
      description
      image {
        id
        url
        altText
        width
        height
      }
      products(first: 1) {
        nodes {
          id
        }
      }
    }
  }
}"#,
    DependencyTag::Catalog,
);

/// Most recently updated products for the featured grid.
pub const RECOMMENDED_PRODUCTS: GraphQlQuery = GraphQlQuery::new(
    "RecommendedProducts",
    r#"query RecommendedProducts($country: CountryCode, $language: LanguageCode)
  @inContext(country: $country, language: $language) {
  products(first: 4, sortKey: UPDATED_AT, reverse: true) {
    nodes {
      id
      title
      handle
      availableForSale
      priceRange {
        minVariantPrice {
          amount
          currencyCode
        }
      }
      featuredImage {
        id
        url
        altText
        width
        height
      }
    }
  }
}"#,
    DependencyTag::Recommendations,
);

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageNode {
    id: Option<ImageId>,
    url: String,
    alt_text: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl From<ImageNode> for Image {
    fn from(node: ImageNode) -> Self {
        Self {
            id: node.id,
            url: node.url,
            alt_text: node.alt_text,
            width: node.width,
            height: node.height,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdNode {
    #[allow(dead_code)]
    id: ProductId,
}

#[derive(Debug, Deserialize)]
struct CollectionNode {
    id: CollectionId,
    title: String,
    handle: String,
    #[serde(default)]
    description: String,
    image: Option<ImageNode>,
    products: Option<Connection<IdNode>>,
}

#[derive(Debug, Deserialize)]
struct AllCollectionsData {
    collections: Connection<CollectionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRange {
    min_variant_price: MoneyV2,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: ProductId,
    title: String,
    handle: String,
    available_for_sale: bool,
    price_range: PriceRange,
    featured_image: Option<ImageNode>,
}

#[derive(Debug, Deserialize)]
struct RecommendedProductsData {
    products: Connection<ProductNode>,
}

/// Map an `AllCollections` payload to collections, in response order.
pub fn decode_collections(data: serde_json::Value) -> Result<Vec<Collection>, QueryError> {
    let data: AllCollectionsData = decode(data)?;
    Ok(data
        .collections
        .nodes
        .into_iter()
        .take(MAX_COLLECTIONS)
        .map(|node| Collection {
            id: node.id,
            title: node.title,
            handle: node.handle,
            description: node.description,
            image: node.image.map(Image::from),
            product_count: node.products.map(|p| p.nodes.len()).unwrap_or(0),
        })
        .collect())
}

/// Map a `RecommendedProducts` payload to products, in response order.
pub fn decode_recommended_products(
    data: serde_json::Value,
) -> Result<Vec<RecommendedProduct>, QueryError> {
    let data: RecommendedProductsData = decode(data)?;
    data.products
        .nodes
        .into_iter()
        .take(MAX_RECOMMENDED)
        .map(|node| {
            let min_price = Money::try_from(node.price_range.min_variant_price)
                .map_err(|e| QueryError::Deserialization(format!("{}: {}", node.handle, e)))?;
            Ok(RecommendedProduct {
                id: node.id,
                title: node.title,
                handle: node.handle,
                available_for_sale: node.available_for_sale,
                min_price,
                featured_image: node.featured_image.map(Image::from),
            })
        })
        .collect()
}
