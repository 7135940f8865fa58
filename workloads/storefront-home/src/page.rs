//! Streaming assembly of the home page.

use std::fmt::Display;

use edge_core::WorkloadError;
use edge_executor::{render_placeholder, render_swap, OrderingStrategy};
use edge_observability::{DeferredOutcome, MetricsCollector, StructuredLogger};
use edge_streaming::{HeadContent, Section, Shell, StreamingSink};
use futures::Sink;
use storefront_catalog::RecommendedProduct;

use crate::loader::HomePage;
use crate::newsletter::NewsletterStatus;
use crate::sections::{
    render_category_cards, render_featured_products, render_footer, render_hero,
    render_newsletter, render_preloader, FEATURED_FALLBACK,
};
use crate::state::{ResolvedTheme, ThemePreference};

pub const PAGE_TITLE: &str = "Wicked Works | Designed with Intention";

const STYLES: &str = r#"
:root[data-theme="dark"] { color-scheme: dark; --bg: #0a0a0a; --fg: #f5f5f5; }
:root[data-theme="light"] { color-scheme: light; --bg: #fafafa; --fg: #111; }
body { margin: 0; background: var(--bg); color: var(--fg); font-family: system-ui, sans-serif; }
@keyframes fadeOut { to { opacity: 0; visibility: hidden; } }
.section-fallback { padding: 5rem 0; text-align: center; opacity: 0.5; }
"#;

/// Per-request presentation inputs.
#[derive(Debug, Clone)]
pub struct HomeView {
    pub theme: ThemePreference,
    pub resolved_theme: ResolvedTheme,
    pub show_preloader: bool,
    pub intro_duration_ms: u64,
    pub ordering: OrderingStrategy,
}

/// Document shell for a storefront page.
pub fn storefront_shell(title: &str, theme: ResolvedTheme) -> Shell {
    Shell::new(
        HeadContent::new(title)
            .with_meta("viewport", "width=device-width, initial-scale=1")
            .with_meta(
                "description",
                "Bold expressions and distinctive aesthetics from Wicked Works.",
            )
            .with_style(STYLES),
    )
    .with_lang("en")
    .with_html_attr("data-theme", theme.as_str())
    .with_body_start("<body>\n<main class=\"home\">\n")
    .with_body_end("</body>\n</html>\n")
}

/// The deferred featured-products section.
pub fn featured_section() -> Section {
    Section::deferred("featured_products")
        .depends_on("recommendations")
        .with_fallback(FEATURED_FALLBACK)
}

/// Stream the home page into `sink`.
///
/// The shell and critical sections go out first. Where the deferred
/// recommendations land depends on `view.ordering`.
pub async fn stream_home_page<S, E>(
    sink: &mut StreamingSink<S, E>,
    view: &HomeView,
    page: HomePage,
    metrics: &mut MetricsCollector,
    logger: &StructuredLogger,
) -> Result<(), WorkloadError>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    let shell = storefront_shell(PAGE_TITLE, view.resolved_theme);
    let HomePage {
        critical: collections,
        deferred,
    } = page;

    sink.send_shell(&shell.render_opening()).await?;
    metrics.record_shell_sent();

    if view.show_preloader {
        send(sink, metrics, "preloader", &render_preloader(view.intro_duration_ms)).await?;
    }
    send(sink, metrics, "hero", &render_hero()).await?;
    send(sink, metrics, "category_cards", &render_category_cards(&collections)).await?;

    let section = featured_section();
    let late = match view.ordering {
        OrderingStrategy::Strict => {
            let (html, outcome) = render_deferred(deferred.resolve().await);
            send(sink, metrics, &section.name, &html).await?;
            metrics.record_deferred(outcome);
            None
        }
        OrderingStrategy::OutOfOrder if !deferred.is_pending() => {
            let (html, outcome) = render_deferred(deferred.resolve().await);
            send(sink, metrics, &section.name, &html).await?;
            metrics.record_deferred(outcome);
            None
        }
        OrderingStrategy::OutOfOrder => {
            sink.send_raw(render_placeholder(&section).into_bytes())
                .await?;
            Some(deferred)
        }
    };

    send(sink, metrics, "newsletter", &render_newsletter(NewsletterStatus::Idle, "")).await?;
    sink.send_raw(b"</main>\n".to_vec()).await?;
    send(sink, metrics, "footer", &render_footer(view.theme)).await?;

    if let Some(deferred) = late {
        let (html, outcome) = render_deferred(deferred.resolve().await);
        send(sink, metrics, &section.name, &render_swap(&section, &html)).await?;
        metrics.record_deferred(outcome);
    }

    sink.send_raw(shell.render_closing().into_bytes()).await?;
    sink.complete().await?;

    logger
        .debug_builder("Home page streamed")
        .field("ordering", format!("{:?}", view.ordering))
        .field("sections", sink.sections_sent().join(","))
        .field_i64("bytes", sink.bytes_sent() as i64)
        .emit();
    Ok(())
}

/// Full page for a newsletter form submission, rendered in one piece.
pub fn render_newsletter_page(
    theme: ThemePreference,
    resolved_theme: ResolvedTheme,
    status: NewsletterStatus,
    email: &str,
) -> String {
    let shell = storefront_shell(PAGE_TITLE, resolved_theme);
    let mut html = shell.render_opening();
    html.push_str(&render_newsletter(status, email));
    html.push_str("</main>\n");
    html.push_str(&render_footer(theme));
    html.push_str(&shell.render_closing());
    html
}

/// Featured section HTML and the outcome to record once it is delivered.
/// Absent products render nothing.
fn render_deferred(products: Option<Vec<RecommendedProduct>>) -> (String, DeferredOutcome) {
    match products {
        Some(products) => (render_featured_products(&products), DeferredOutcome::Resolved),
        None => (String::new(), DeferredOutcome::Absent),
    }
}

async fn send<S, E>(
    sink: &mut StreamingSink<S, E>,
    metrics: &mut MetricsCollector,
    name: &str,
    html: &str,
) -> Result<(), WorkloadError>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    if html.is_empty() {
        return Ok(());
    }
    sink.send_section(name, html).await?;
    metrics.record_section_sent(name);
    Ok(())
}
