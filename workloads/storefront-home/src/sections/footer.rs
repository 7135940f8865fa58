//! Site footer with navigation and the theme switcher.

use crate::state::ThemePreference;

const NAV: [(&str, &str); 3] = [
    ("Home", "/"),
    ("Catalog", "/collections/all"),
    ("Contact", "/contact"),
];

/// Render the footer. `active` marks the visitor's stored preference.
pub fn render_footer(active: ThemePreference) -> String {
    let links: String = NAV
        .iter()
        .map(|(label, href)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect::<Vec<_>>()
        .join("\n            ");

    let buttons: String = ThemePreference::ALL
        .iter()
        .map(|theme| {
            let class = if *theme == active {
                "theme-button active"
            } else {
                "theme-button"
            };
            format!(
                r#"<button type="submit" name="theme" value="{value}" class="{class}" aria-label="{label}">{value}</button>"#,
                value = theme.as_str(),
                label = theme.label(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n                ");

    format!(
        r#"<footer class="site-footer" data-section="footer">
    <div class="footer-inner">
        <a class="footer-logo" href="/">Wicked Works</a>
        <nav class="footer-nav">
            {links}
        </nav>
        <div class="footer-meta">
            <span class="footer-status"><span class="status-dot"></span>All systems normal</span>
            <form class="theme-switcher" method="post" action="/theme">
                {buttons}
            </form>
        </div>
    </div>
</footer>
"#
    )
}
