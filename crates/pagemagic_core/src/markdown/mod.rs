//! Markdown to sanitized HTML.
//!
//! Content shown by the viewer comes from crawled third-party pages and from
//! LLM rewrites, so every render goes through an allow-list sanitizer after
//! comrak has produced HTML. Raw HTML in the markdown is passed through by
//! the parser on purpose and filtered afterwards, which keeps harmless inline
//! markup (`<u>`, `<figure>`, ...) that pages commonly contain.
//!
//! Renderer options are fixed per [`MarkdownRenderer`]; nothing is shared or
//! mutated between calls.

mod annotate;
mod sanitize;

pub use annotate::{Annotation, AnnotationKind};

use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use sanitize::SanitizePolicy;

/// Output shape of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Full document markup (paragraphs, headings, lists, tables...)
    Block,
    /// Phrase-level markup only, for titles and meta fields
    Inline,
}

/// Markdown renderer bound to one immutable [`RenderConfig`].
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    config: RenderConfig,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl MarkdownRenderer {
    /// Create a renderer.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// The configuration this renderer was built with.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn configure(&self, options: &mut comrak::Options) {
        options.extension.strikethrough = self.config.gfm;
        options.extension.table = self.config.gfm;
        options.extension.autolink = self.config.gfm;
        options.extension.tasklist = self.config.gfm;
        options.render.hardbreaks = self.config.hard_breaks;
        // Raw HTML is filtered by the sanitizer below
        options.render.r#unsafe = true;
    }

    /// Render markdown (or plain text) to sanitized HTML.
    ///
    /// Never fails: if sanitizing errors out, the input is returned escaped.
    pub fn render(&self, markdown: &str, mode: RenderMode) -> String {
        if markdown.trim().is_empty() {
            return String::new();
        }

        let mut options = comrak::Options::default();
        self.configure(&mut options);
        let html = comrak::markdown_to_html(markdown, &options);

        let tags = match mode {
            RenderMode::Block => &self.config.block_tags,
            RenderMode::Inline => &self.config.inline_tags,
        };
        let policy = SanitizePolicy {
            tags,
            attributes: &self.config.attributes,
            url_schemes: &self.config.url_schemes,
        };

        match sanitize::sanitize(&html, &policy) {
            Ok(clean) => match mode {
                RenderMode::Block => clean,
                RenderMode::Inline => clean.trim().to_string(),
            },
            Err(e) => {
                log::warn!("Sanitizer failed, rendering as literal text: {}", e);
                escape_html(markdown)
            }
        }
    }

    /// Render in [`RenderMode::Block`].
    pub fn render_block(&self, markdown: &str) -> String {
        self.render(markdown, RenderMode::Block)
    }

    /// Render in [`RenderMode::Inline`].
    pub fn render_inline(&self, markdown: &str) -> String {
        self.render(markdown, RenderMode::Inline)
    }

    /// Walk the parsed document once and report heading and list item positions.
    pub fn annotate(&self, markdown: &str) -> Vec<Annotation> {
        let mut options = comrak::Options::default();
        self.configure(&mut options);
        annotate::annotate(markdown, &options)
    }
}

/// Escape text for safe inclusion in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
