//! Arena scene graph for loaded SVG documents.
//!
//! Every element, text run, and comment of the sanitized markup lives in a
//! `StableDiGraph`; edges go parent → child. Node indices stay valid while
//! other nodes are removed, and each node carries a `NodeId` that
//! is stable for the lifetime of the document.
//!
//! The arena reuses freed slots, so index order is not document order;
//! child order is tracked explicitly per parent.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;

/// The standard vector-graphics namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The XLink namespace (`xlink:href`).
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

// ─── Elements ────────────────────────────────────────────────────────────

/// A single attribute, kept with its qualified name (`xlink:href`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An element with its qualified tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: SmallVec<[Attribute; 6]>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: SmallVec::new(),
        }
    }

    /// Tag name without any namespace prefix (`svg:rect` → `rect`).
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }

    /// Builder-style attribute setter, handy when constructing fragments.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }
}

/// Strip a namespace prefix from a qualified name.
pub fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

// ─── Element classification ──────────────────────────────────────────────

/// Elements that render and answer a bounding-box query.
pub fn is_graphics_element(local_name: &str) -> bool {
    matches!(
        local_name,
        "rect"
            | "circle"
            | "ellipse"
            | "line"
            | "polyline"
            | "polygon"
            | "path"
            | "text"
            | "tspan"
            | "textPath"
            | "image"
            | "use"
            | "g"
            | "a"
            | "switch"
            | "svg"
            | "foreignObject"
    )
}

/// Graphics elements whose geometry is the union of their children.
pub fn is_container(local_name: &str) -> bool {
    matches!(local_name, "g" | "a" | "switch" | "svg")
}

/// Elements whose text content is editable in the inspector.
pub fn is_text_bearing(local_name: &str) -> bool {
    matches!(local_name, "text" | "tspan" | "textPath")
}

/// Elements that never paint their subtree directly.
pub fn is_non_rendered_container(local_name: &str) -> bool {
    matches!(
        local_name,
        "defs"
            | "clipPath"
            | "mask"
            | "marker"
            | "pattern"
            | "symbol"
            | "linearGradient"
            | "radialGradient"
            | "filter"
            | "metadata"
            | "title"
            | "desc"
            | "style"
            | "script"
    )
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// What a node of the document tree holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

/// A single node in the document arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgNode {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl SvgNode {
    /// Wrap an element, assigning it a fresh `<tag>_<n>` id.
    pub fn element(element: Element) -> Self {
        Self {
            id: NodeId::fresh(element.local_name()),
            kind: NodeKind::Element(element),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh("text_node"),
            kind: NodeKind::Text(content.into()),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh("comment"),
            kind: NodeKind::Comment(content.into()),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// A parsed SVG document: an arena of `SvgNode` values under one `<svg>` root.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    /// The underlying directed graph (parent → child edges).
    pub graph: StableDiGraph<SvgNode, ()>,

    /// The root `<svg>` element.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Document order of each parent's children.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl SvgDocument {
    /// Create a document holding only `root`.
    #[must_use]
    pub fn new(root: Element) -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = SvgNode::element(root);
        let root_id = root_node.id;
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Append `node` as the last child of `parent`. Returns the new index.
    pub fn add_child(&mut self, parent: NodeIndex, node: SvgNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        self.child_order.entry(parent).or_default().push(idx);
        idx
    }

    /// Remove a node and everything below it, keeping indexes in sync.
    pub fn remove_subtree(&mut self, idx: NodeIndex) {
        if idx == self.root {
            return;
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        let mut doomed = self.descendants(idx);
        doomed.push(idx);
        for node in doomed {
            self.child_order.remove(&node);
            if let Some(removed) = self.graph.remove_node(node) {
                self.id_index.remove(&removed.id);
            }
        }
    }

    /// Remove every child of `idx`.
    pub fn clear_children(&mut self, idx: NodeIndex) {
        for child in self.children(idx).to_vec() {
            self.remove_subtree(child);
        }
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&SvgNode> {
        self.graph.node_weight(idx)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut SvgNode> {
        self.graph.node_weight_mut(idx)
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        self.get(idx).and_then(SvgNode::as_element)
    }

    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        self.get_mut(idx).and_then(SvgNode::as_element_mut)
    }

    /// The root `<svg>` element.
    pub fn root_element(&self) -> Option<&Element> {
        self.element(self.root)
    }

    pub fn root_element_mut(&mut self) -> Option<&mut Element> {
        self.element_mut(self.root)
    }

    /// Get the index for a NodeId.
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn id_of(&self, idx: NodeIndex) -> Option<NodeId> {
        self.get(idx).map(|n| n.id)
    }

    /// Whether `idx` still refers to a live node.
    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map_or(&[], Vec::as_slice)
    }

    /// Ancestors of a node, nearest first, ending at the root.
    pub fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            out.push(parent);
            current = parent;
        }
        out
    }

    /// All nodes below `idx` in document (pre-)order, excluding `idx`.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.children(idx).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every text node below `idx` (DOM `textContent`).
    pub fn text_content(&self, idx: NodeIndex) -> String {
        if let Some(SvgNode {
            kind: NodeKind::Text(t),
            ..
        }) = self.get(idx)
        {
            return t.clone();
        }
        self.descendants(idx)
            .into_iter()
            .filter_map(|d| match self.get(d).map(|n| &n.kind) {
                Some(NodeKind::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace every child of `idx` with a single text node (DOM `textContent = ..`).
    pub fn set_text_content(&mut self, idx: NodeIndex, content: &str) {
        self.clear_children(idx);
        if !content.is_empty() {
            self.add_child(idx, SvgNode::text(content));
        }
    }

    /// Find the first element carrying `id="<value>"` (used by `<use href="#..">`).
    pub fn find_by_id_attr(&self, value: &str) -> Option<NodeIndex> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|&idx| self.element(idx).and_then(|el| el.attr("id")) == Some(value))
    }

    /// Every element in the document, in document order, root first.
    pub fn elements(&self) -> Vec<NodeIndex> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|&idx| self.element(idx).is_some())
            .collect()
    }
}
