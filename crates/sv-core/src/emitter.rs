//! Emitter: `SvgDocument` → markup text.
//!
//! Attributes are written in stored order with double quotes; elements
//! without children are self-closed. The output always re-parses to an
//! equivalent arena.

use crate::model::{NodeKind, SvgDocument};
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Emit a document as markup text.
#[must_use]
pub fn emit_document(doc: &SvgDocument) -> String {
    let mut out = String::with_capacity(1024);
    emit_node(&mut out, doc, doc.root);
    out
}

/// Emit a single node and its subtree.
#[must_use]
pub fn emit_subtree(doc: &SvgDocument, idx: NodeIndex) -> String {
    let mut out = String::new();
    emit_node(&mut out, doc, idx);
    out
}

fn emit_node(out: &mut String, doc: &SvgDocument, idx: NodeIndex) {
    let Some(node) = doc.get(idx) else {
        return;
    };
    match &node.kind {
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for attr in &el.attrs {
                let _ = write!(out, " {}=\"{}\"", attr.name, escape_attr(&attr.value));
            }
            let children = doc.children(idx);
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in children {
                emit_node(out, doc, child);
            }
            let _ = write!(out, "</{}>", el.name);
        }
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
