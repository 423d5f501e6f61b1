//! Sanitized SVG markup → `SvgDocument` arena.
//!
//! Built on `roxmltree`. Namespace prefixes are reconstructed from the
//! in-scope declarations so the emitter can write `xlink:href`, `xml:space`
//! and `xmlns:*` back out unchanged.
//!
//! The builder also drops `script` and `foreignObject` elements, inline event
//! handlers, and script-URI links, whatever the textual sanitizer let through.

use crate::model::{Attribute, Element, SvgDocument, SvgNode};
use crate::sanitize::{is_event_handler, is_script_uri};
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Why markup could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed markup: {0}")]
    Xml(String),
    #[error("root element is <{0}>, expected <svg>")]
    NotSvgRoot(String),
}

/// Parse SVG markup into a `SvgDocument`.
#[must_use = "parsing result should be used"]
pub fn parse_svg(text: &str) -> Result<SvgDocument, ParseError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| ParseError::Xml(e.to_string()))?;

    let xml_root = xml.root_element();
    let root_name = xml_root.tag_name().name();
    if root_name != "svg" {
        return Err(ParseError::NotSvgRoot(root_name.to_string()));
    }

    let mut doc = SvgDocument::new(build_element(xml_root));
    let root = doc.root;
    append_children(&mut doc, root, xml_root);
    log::debug!(
        "parsed svg document: {} nodes",
        doc.graph.node_count()
    );
    Ok(doc)
}

fn append_children(doc: &mut SvgDocument, parent: NodeIndex, xml: roxmltree::Node<'_, '_>) {
    for child in xml.children() {
        if child.is_element() {
            let local = child.tag_name().name();
            if local == "script" || local == "foreignObject" {
                log::debug!("dropping <{local}> while building arena");
                continue;
            }
            let idx = doc.add_child(parent, SvgNode::element(build_element(child)));
            append_children(doc, idx, child);
        } else if child.is_text() {
            if let Some(text) = child.text() {
                doc.add_child(parent, SvgNode::text(text));
            }
        } else if child.is_comment()
            && let Some(text) = child.text()
        {
            doc.add_child(parent, SvgNode::comment(text));
        }
    }
}

fn build_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let mut attrs: SmallVec<[Attribute; 6]> = SmallVec::new();

    for (prefix, uri) in declared_namespaces(node) {
        let name = match prefix {
            Some(p) => format!("xmlns:{p}"),
            None => "xmlns".to_string(),
        };
        attrs.push(Attribute { name, value: uri });
    }

    for attr in node.attributes() {
        let name = qualified_name(node, attr.namespace(), attr.name());
        if is_event_handler(&name) {
            continue;
        }
        if is_link_attr(&name) && is_script_uri(attr.value()) {
            continue;
        }
        attrs.push(Attribute {
            name,
            value: attr.value().to_string(),
        });
    }

    Element {
        name: qualified_name(node, tag.namespace(), tag.name()),
        attrs,
    }
}

fn is_link_attr(name: &str) -> bool {
    name == "href" || name == "xlink:href"
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(XML_NAMESPACE) => format!("xml:{local}"),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() && !default_namespace_is(node, uri) => {
                format!("{prefix}:{local}")
            }
            _ => local.to_string(),
        },
        None => local.to_string(),
    }
}

/// Elements in the default namespace keep unprefixed names even when the same
/// URI is also bound to a prefix.
fn default_namespace_is(node: roxmltree::Node<'_, '_>, uri: &str) -> bool {
    node.namespaces()
        .any(|ns| ns.name().is_none() && ns.uri() == uri)
}

/// Namespace declarations introduced on `node` (not inherited from its parent).
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(Option<String>, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect()
}
