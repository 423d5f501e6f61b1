//! Per-node override transforms, kept in a side table keyed by `NodeId`.
//!
//! The table is the source of truth for nodes the editor has touched. Only
//! the rendering `transform` attribute is written back to the document, so
//! exported markup carries no private bookkeeping.

use std::collections::HashMap;
use sv_core::transform::{Transform, parse_transform_attr};
use sv_core::{NodeId, NodeIndex, SvgDocument};

#[derive(Debug, Clone, Default)]
pub struct TransformStore {
    table: HashMap<NodeId, Transform>,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node's current transform.
    ///
    /// Lookup order: side table, then legacy bookkeeping attributes, then the
    /// node's own `transform` attribute (translate/scale only), then identity.
    pub fn get(&self, doc: &SvgDocument, idx: NodeIndex) -> Transform {
        let Some(node) = doc.get(idx) else {
            return Transform::IDENTITY;
        };
        if let Some(t) = self.table.get(&node.id) {
            return *t;
        }
        let Some(el) = node.as_element() else {
            return Transform::IDENTITY;
        };
        Transform::from_bookkeeping(el)
            .or_else(|| el.attr("transform").map(parse_transform_attr))
            .unwrap_or_default()
    }

    /// Record `t` for the node and write its `transform` attribute,
    /// replacing whatever was there.
    pub fn set(&mut self, doc: &mut SvgDocument, idx: NodeIndex, t: Transform) {
        let Some(node) = doc.get_mut(idx) else {
            log::debug!("set transform on missing node {idx:?}");
            return;
        };
        let id = node.id;
        if let Some(el) = node.as_element_mut() {
            el.set_attr("transform", t.to_attr());
            self.table.insert(id, t);
            log::trace!("transform {id} = {t:?}");
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
