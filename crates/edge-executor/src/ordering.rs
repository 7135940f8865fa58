//! Out-of-order streaming support.

use edge_streaming::{escape_html, Section};
use serde::Deserialize;

/// Strategy for placing deferred sections in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingStrategy {
    /// Stream sections in DOM order.
    /// Later sections wait for the deferred one.
    Strict,

    /// Send a placeholder in place and keep streaming. The resolved section
    /// arrives at the end of the document and is swapped in by script.
    #[default]
    OutOfOrder,
}

/// Placeholder sent in DOM position while a deferred section is pending.
pub fn render_placeholder(section: &Section) -> String {
    format!(
        r#"<div id="{}" data-section="{}">{}</div>"#,
        section.slot_id(),
        escape_html(&section.name),
        section.render_fallback()
    )
}

/// Late payload for a deferred section.
///
/// The template carries the resolved HTML; the script replaces the
/// placeholder with it, or removes the placeholder when `html` is empty.
pub fn render_swap(section: &Section, html: &str) -> String {
    let slot = section.slot_id();
    format!(
        r#"<template data-slot="{slot}">{html}</template>
<script>(function(id){{var t=document.querySelector('template[data-slot="'+id+'"]');var s=document.getElementById(id);if(s){{if(t&&t.content.childNodes.length){{s.replaceWith(t.content.cloneNode(true));}}else{{s.remove();}}}}if(t){{t.remove();}}}})("{slot}");</script>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn featured() -> Section {
        Section::deferred("featured_products").with_fallback("Loading products...")
    }

    #[test]
    fn test_default_is_out_of_order() {
        assert_eq!(OrderingStrategy::default(), OrderingStrategy::OutOfOrder);
    }

    #[test]
    fn test_deserialize() {
        let strategy: OrderingStrategy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(strategy, OrderingStrategy::Strict);
    }

    #[test]
    fn test_placeholder() {
        let html = render_placeholder(&featured());
        assert!(html.starts_with(r#"<div id="slot-featured_products" data-section="featured_products">"#));
        assert!(html.contains("Loading products..."));
    }

    #[test]
    fn test_swap() {
        let html = render_swap(&featured(), "<section>products</section>");
        assert!(html.contains(r#"<template data-slot="slot-featured_products"><section>products</section></template>"#));
        assert!(html.contains(r#"("slot-featured_products")"#));
    }
}
