//! Displayed state of a content version.
//!
//! A [`Frame`] is what the viewer shows at one instant: for each field, the
//! spans currently visible. Frames are never stored; the sequencer projects
//! them from its reveal progress, so asking twice gives the same answer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::diff::SegmentKind;
use crate::markdown::{MarkdownRenderer, escape_html};
use crate::version::{FieldKey, VersionDiff};

/// How a visible span is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SpanKind {
    /// Text shared with the baseline
    Unchanged,
    /// Text introduced by this version
    Added,
    /// Removed meta text, shown struck through while animating
    Struck,
}

/// A run of visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DisplaySpan {
    /// Presentation
    pub kind: SpanKind,
    /// Text shown
    pub text: String,
}

/// Visible spans of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FieldView {
    /// Field shown
    pub field: FieldKey,
    /// Spans in document order, adjacent spans of the same kind merged
    pub spans: Vec<DisplaySpan>,
}

impl FieldView {
    /// Visible text, struck spans included.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Text that will remain once the animation ends (struck spans excluded).
    pub fn settled_text(&self) -> String {
        self.spans
            .iter()
            .filter(|s| s.kind != SpanKind::Struck)
            .map(|s| s.text.as_str())
            .collect()
    }

    /// HTML for this field.
    ///
    /// The body is rendered as block markdown. Meta fields are rendered span
    /// by span in inline mode and wrapped so additions and strike-throughs
    /// stay visible.
    pub fn to_html(&self, renderer: &MarkdownRenderer) -> String {
        if self.field == FieldKey::Body {
            return format!(
                "<div class=\"pm-body\">\n{}</div>",
                renderer.render_block(&self.text())
            );
        }

        let mut inner = String::new();
        for span in &self.spans {
            let text = render_meta_span(renderer, &span.text);
            match span.kind {
                SpanKind::Unchanged => inner.push_str(&text),
                SpanKind::Added => {
                    inner.push_str("<ins class=\"pm-added\">");
                    inner.push_str(&text);
                    inner.push_str("</ins>");
                }
                SpanKind::Struck => {
                    inner.push_str("<del class=\"pm-struck\">");
                    inner.push_str(&text);
                    inner.push_str("</del>");
                }
            }
        }
        format!(
            "<div class=\"pm-meta\" data-field=\"{}\">{}</div>",
            escape_html(&self.field.label()),
            inner
        )
    }
}

/// Everything displayed for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Frame {
    /// Version number shown
    pub version: u32,
    /// Rule that produced it
    pub rule: Option<String>,
    /// Non-empty fields, meta first, body last
    pub fields: Vec<FieldView>,
}

/// Reveal progress of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reveal {
    /// Not reached yet
    Pending,
    /// Added text shown up to this byte offset
    Partial(usize),
    /// Removed text shown struck through
    Struck,
    /// Finished: added text fully shown, removed text gone
    Done,
}

impl Frame {
    /// The settled frame for `diff`: every addition shown, every removal gone.
    pub fn final_for(diff: &VersionDiff) -> Self {
        Self::project(diff, |_, _| Reveal::Done)
    }

    pub(crate) fn project(diff: &VersionDiff, progress: impl Fn(usize, usize) -> Reveal) -> Self {
        let fields = diff
            .fields()
            .enumerate()
            .filter_map(|(f, field_diff)| {
                let mut spans: Vec<DisplaySpan> = Vec::new();
                for (s, segment) in field_diff.segments.iter().enumerate() {
                    let shown = match (segment.kind, progress(f, s)) {
                        (SegmentKind::Unchanged, _) => Some((SpanKind::Unchanged, segment.value.as_str())),
                        (SegmentKind::Added, Reveal::Done) => Some((SpanKind::Added, segment.value.as_str())),
                        (SegmentKind::Added, Reveal::Partial(end)) => segment
                            .value
                            .get(..end)
                            .map(|prefix| (SpanKind::Added, prefix)),
                        (SegmentKind::Removed, Reveal::Struck) => Some((SpanKind::Struck, segment.value.as_str())),
                        _ => None,
                    };
                    if let Some((kind, text)) = shown {
                        push_span(&mut spans, kind, text);
                    }
                }

                if spans.iter().all(|s| s.text.is_empty()) {
                    return None;
                }
                Some(FieldView {
                    field: field_diff.field.clone(),
                    spans,
                })
            })
            .collect();

        Self {
            version: diff.version,
            rule: diff.rule_processed.clone(),
            fields,
        }
    }

    /// View of one field, if it is visible.
    pub fn field(&self, key: &FieldKey) -> Option<&FieldView> {
        self.fields.iter().find(|v| &v.field == key)
    }

    /// View of the body, if it is visible.
    pub fn body(&self) -> Option<&FieldView> {
        self.field(&FieldKey::Body)
    }

    /// Whether any span is still struck through.
    pub fn has_struck(&self) -> bool {
        self.fields
            .iter()
            .any(|v| v.spans.iter().any(|s| s.kind == SpanKind::Struck))
    }

    /// HTML for the whole frame.
    pub fn to_html(&self, renderer: &MarkdownRenderer) -> String {
        let mut html = format!("<section class=\"pm-version\" data-version=\"{}\">\n", self.version);
        if let Some(rule) = &self.rule {
            html.push_str(&format!("<p class=\"pm-rule\">{}</p>\n", escape_html(rule)));
        }
        for view in &self.fields {
            html.push_str(&view.to_html(renderer));
            html.push('\n');
        }
        html.push_str("</section>\n");
        html
    }
}

/// Inline markdown for one meta span, keeping the whitespace around it.
///
/// A span that renders to nothing (a lone `-` or `2024.` parses as an empty
/// list item) is shown as escaped text instead.
fn render_meta_span(renderer: &MarkdownRenderer, text: &str) -> String {
    let core = text.trim();
    if core.is_empty() {
        return escape_html(text);
    }
    let start = text.len() - text.trim_start().len();
    let end = start + core.len();

    let rendered = renderer.render_inline(core);
    let rendered = if rendered.trim().is_empty() {
        escape_html(core)
    } else {
        rendered
    };
    format!(
        "{}{}{}",
        escape_html(&text[..start]),
        rendered,
        escape_html(&text[end..])
    )
}

fn push_span(spans: &mut Vec<DisplaySpan>, kind: SpanKind, text: &str) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.kind == kind => last.text.push_str(text),
        _ => spans.push(DisplaySpan {
            kind,
            text: text.to_string(),
        }),
    }
}
