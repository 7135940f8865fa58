//! Shell template abstraction.

use crate::escape::escape_html;

/// Head content for the shell.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    /// Page title.
    pub title: Option<String>,
    /// Meta tags.
    pub meta: Vec<(String, String)>,
    /// Inline CSS blocks.
    pub styles: Vec<String>,
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add a meta tag.
    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    /// Add inline CSS styles.
    pub fn with_style(mut self, css: &str) -> Self {
        self.styles.push(css.to_string());
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::from("<meta charset=\"utf-8\">\n");

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        }

        for (name, content) in &self.meta {
            html.push_str(&format!(
                "<meta name=\"{}\" content=\"{}\">\n",
                escape_html(name),
                escape_html(content)
            ));
        }

        for css in &self.styles {
            html.push_str(&format!("<style>{}</style>\n", css));
        }

        html
    }
}

/// Shell template with section placeholders.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Include doctype declaration.
    pub doctype: bool,
    /// `lang` attribute on the root element.
    pub lang: String,
    /// Extra attributes on the root element, e.g. `data-theme`.
    pub html_attrs: Vec<(String, String)>,
    /// Head content.
    pub head: HeadContent,
    /// HTML before sections (opening body, wrapper divs, etc.).
    pub body_start: String,
    /// HTML after sections (closing tags).
    pub body_end: String,
}

impl Shell {
    /// Create a new shell with basic structure.
    pub fn new(head: HeadContent) -> Self {
        Self {
            doctype: true,
            lang: "en".to_string(),
            html_attrs: Vec::new(),
            head,
            body_start: "<body>\n<main>\n".to_string(),
            body_end: "</main>\n</body>\n</html>".to_string(),
        }
    }

    /// Set the document language.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Add an attribute to the root element.
    pub fn with_html_attr(mut self, name: &str, value: &str) -> Self {
        self.html_attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Set custom body start HTML.
    pub fn with_body_start(mut self, html: impl Into<String>) -> Self {
        self.body_start = html.into();
        self
    }

    /// Set custom body end HTML.
    pub fn with_body_end(mut self, html: impl Into<String>) -> Self {
        self.body_end = html.into();
        self
    }

    /// Render the opening part of the shell (before sections).
    pub fn render_opening(&self) -> String {
        let mut html = String::new();

        if self.doctype {
            html.push_str("<!DOCTYPE html>\n");
        }

        html.push_str(&format!("<html lang=\"{}\"", escape_html(&self.lang)));
        for (name, value) in &self.html_attrs {
            html.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        html.push_str(">\n<head>\n");
        html.push_str(&self.head.render());
        html.push_str("</head>\n");
        html.push_str(&self.body_start);

        html
    }

    /// Render the closing part of the shell (after sections).
    pub fn render_closing(&self) -> String {
        self.body_end.clone()
    }
}
