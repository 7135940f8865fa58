//! Hero banner.

/// Render the hero banner. Static content.
pub fn render_hero() -> String {
    r#"<section class="hero" data-section="hero">
    <div class="hero-content">
        <h1 class="hero-title">Designed with Intention</h1>
        <p class="hero-subtitle">Experience bold expressions and distinctive aesthetics crafted for those who dare to stand out.</p>
        <a class="button button-primary" href="/collections/all">Shop Now</a>
    </div>
</section>
"#
    .to_string()
}
