//! Category cards, one per catalog collection.

use edge_streaming::escape_html;
use storefront_catalog::model::EXCERPT_CHARS;
use storefront_catalog::Collection;

/// Render the category grid. Empty input renders nothing.
pub fn render_category_cards(collections: &[Collection]) -> String {
    if collections.is_empty() {
        return String::new();
    }

    let cards: String = collections.iter().map(render_card).collect();

    format!(
        r#"<section class="categories" data-section="category_cards">
    <header class="section-header">
        <h2>Shop by Category</h2>
        <p>Explore our curated collections</p>
    </header>
    <div class="category-grid">
{cards}    </div>
</section>
"#
    )
}

fn render_card(collection: &Collection) -> String {
    let image_html = collection
        .image
        .as_ref()
        .map(|img| {
            format!(
                r#"<img src="{}" alt="{}" loading="lazy"{}{}>"#,
                escape_html(&img.url),
                escape_html(img.alt_or(&collection.title)),
                img.width
                    .map(|w| format!(r#" width="{}""#, w))
                    .unwrap_or_default(),
                img.height
                    .map(|h| format!(r#" height="{}""#, h))
                    .unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    let description = collection
        .excerpt(EXCERPT_CHARS)
        .map(|text| format!(r#"<p class="category-description">{}</p>"#, escape_html(&text)))
        .unwrap_or_default();

    format!(
        r#"        <a class="category-card" href="{url}">
            <div class="category-image">{image_html}</div>
            <h3 class="category-title">{title}</h3>
            {description}
            <div class="category-footer">
                <span class="category-count">{count}</span>
                <span class="category-cta">Explore &rarr;</span>
            </div>
        </a>
"#,
        url = escape_html(&collection.url()),
        title = escape_html(&collection.title),
        count = collection.product_count_label(),
    )
}
