//! Post-render annotation pass.
//!
//! The viewer decorates headings and list items (level badges, bullet
//! indicators). Instead of inspecting rendered markup, callers get the
//! positions straight from the parsed document.

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{Arena, Options, parse_document};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// What a decorated node is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum AnnotationKind {
    /// `#`..`######` or setext heading
    Heading {
        /// 1 to 6
        level: u8,
    },
    /// An item of a bullet or ordered list
    ListItem {
        /// Whether the enclosing list is numbered
        ordered: bool,
        /// Display number (ordered lists honour their start value)
        ordinal: usize,
        /// Nesting depth, 1 for top-level lists
        depth: usize,
    },
}

/// Position metadata for one decorated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Annotation {
    /// Node kind and its attributes
    pub kind: AnnotationKind,
    /// Plain text of the node, nested lists excluded
    pub text: String,
    /// 1-based source line where the node starts
    pub line: usize,
}

pub(crate) fn annotate(markdown: &str, options: &Options) -> Vec<Annotation> {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, options);

    let mut annotations = Vec::new();
    for node in root.descendants() {
        let ast = node.data.borrow();
        let kind = match &ast.value {
            NodeValue::Heading(heading) => AnnotationKind::Heading {
                level: heading.level,
            },
            NodeValue::Item(_) => list_item_kind(node),
            _ => continue,
        };

        let mut text = String::new();
        collect_text(node, &mut text);
        annotations.push(Annotation {
            kind,
            text: text.trim().to_string(),
            line: ast.sourcepos.start.line,
        });
    }
    annotations
}

fn list_item_kind<'a>(item: &'a AstNode<'a>) -> AnnotationKind {
    let position = item.preceding_siblings().count() - 1;

    let (ordered, start) = item
        .parent()
        .and_then(|parent| match &parent.data.borrow().value {
            NodeValue::List(list) => Some((list.list_type == ListType::Ordered, list.start)),
            _ => None,
        })
        .unwrap_or((false, 1));

    let depth = item
        .ancestors()
        .filter(|a| matches!(a.data.borrow().value, NodeValue::List(_)))
        .count();

    AnnotationKind::ListItem {
        ordered,
        ordinal: if ordered { start + position } else { position + 1 },
        depth,
    }
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        let ast = child.data.borrow();
        match &ast.value {
            NodeValue::Text(text) => out.push_str(&text[..]),
            NodeValue::Code(code) => out.push_str(&code.literal[..]),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            NodeValue::List(_) => {}
            _ => collect_text(child, out),
        }
    }
}
