//! First-visit preloader overlay.

/// Render the intro overlay. It fades out and is removed after
/// `duration_ms`.
pub fn render_preloader(duration_ms: u64) -> String {
    let fade_ms = duration_ms.saturating_sub(500);
    format!(
        r#"<div id="preloader" class="preloader" data-section="preloader" style="animation: fadeOut 0.5s ease-out {fade_ms}ms forwards">
    <h1 class="preloader-title">Wicked Works</h1>
    <div class="preloader-spinner" aria-hidden="true"></div>
</div>
<script>setTimeout(function(){{var p=document.getElementById("preloader");if(p){{p.remove();}}}},{duration_ms});</script>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_preloader() {
        let html = render_preloader(3500);
        assert!(html.contains("Wicked Works"));
        assert!(html.contains("3000ms forwards"));
        assert!(html.contains("},3500);</script>"));
    }

    #[test]
    fn test_short_duration() {
        assert!(render_preloader(200).contains(" 0ms forwards"));
    }
}
