//! Featured product grid.

use edge_streaming::escape_html;
use storefront_catalog::RecommendedProduct;

/// Text shown while recommendations are still loading.
pub const FEATURED_FALLBACK: &str = "Loading products...";

/// Render the featured products grid. Empty input renders nothing.
pub fn render_featured_products(products: &[RecommendedProduct]) -> String {
    if products.is_empty() {
        return String::new();
    }

    let cards: String = products.iter().map(render_card).collect();

    format!(
        r#"<section class="featured" data-section="featured_products">
    <header class="section-header">
        <h2>Featured Products</h2>
        <p>Handpicked items just for you</p>
    </header>
    <div class="product-grid">
{cards}    </div>
    <a class="button button-secondary" href="/collections/all">View All Products &rarr;</a>
</section>
"#
    )
}

fn render_card(product: &RecommendedProduct) -> String {
    let image_html = product
        .featured_image
        .as_ref()
        .map(|img| {
            format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                escape_html(&img.url),
                escape_html(img.alt_or(&product.title))
            )
        })
        .unwrap_or_default();

    let stock_class = if product.available_for_sale {
        "in-stock"
    } else {
        "sold-out"
    };

    format!(
        r#"        <a class="product-card" href="{url}">
            <div class="product-image">{image_html}</div>
            <h3 class="product-title">{title}</h3>
            <div class="product-meta">
                <span class="product-price">{price}</span>
                <span class="product-stock {stock_class}">{stock}</span>
            </div>
            <span class="product-cta">View Details &rarr;</span>
        </a>
"#,
        url = escape_html(&product.url()),
        title = escape_html(&product.title),
        price = escape_html(&product.min_price.display()),
        stock = product.availability_label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::{Currency, Money, ProductId};

    fn product(handle: &str, available: bool) -> RecommendedProduct {
        RecommendedProduct {
            id: ProductId::new(format!("gid://shopify/Product/{}", handle)),
            title: format!("{} <tee>", handle),
            handle: handle.into(),
            available_for_sale: available,
            min_price: Money::new(2999, Currency::USD),
            featured_image: None,
        }
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(render_featured_products(&[]), "");
    }

    #[test]
    fn test_product_cards() {
        let html = render_featured_products(&[product("alpha", true), product("beta", false)]);
        assert!(html.contains("Featured Products"));
        assert!(html.contains(r#"href="/products/alpha""#));
        assert!(html.contains("alpha &lt;tee&gt;"));
        assert!(html.contains("$29.99"));
        assert!(html.contains("In Stock"));
        assert!(html.contains("Sold Out"));
        assert!(html.contains("View All Products"));
    }
}
