//! Section abstraction for independently streamable page parts.

use crate::escape::escape_html;

/// A section is a named, independently-streamable part of the page.
#[derive(Debug, Clone)]
pub struct Section {
    /// Section name (used for timing and identification).
    pub name: String,
    /// Dependency tags this section reads from.
    pub dependencies: Vec<String>,
    /// Text shown while a deferred section is pending.
    pub fallback: Option<String>,
}

impl Section {
    /// Create a section whose data may arrive after the shell.
    pub fn deferred(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            fallback: None,
        }
    }

    /// Add a dependency tag.
    pub fn depends_on(mut self, tag: impl Into<String>) -> Self {
        self.dependencies.push(tag.into());
        self
    }

    /// Set the pending fallback text.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// DOM id of the slot a deferred section streams into.
    pub fn slot_id(&self) -> String {
        format!("slot-{}", self.name)
    }

    /// Render the fallback markup, or an empty string without one.
    pub fn render_fallback(&self) -> String {
        match &self.fallback {
            Some(text) => format!(
                r#"<div class="section-fallback" role="status">{}</div>"#,
                escape_html(text)
            ),
            None => String::new(),
        }
    }
}
