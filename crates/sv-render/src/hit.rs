//! Hit testing: point → node lookup.
//!
//! Reverse-walks the document arena (front-to-back) against the resolved
//! bounding boxes to find which element is under a given document-pixel
//! position, then resolves that raw target to the selectable element.

use kurbo::{Point, Rect};
use std::collections::HashMap;
use sv_core::NodeIndex;
use sv_core::model::{SvgDocument, is_container, is_graphics_element};

/// Find the topmost leaf element at position (px, py) in document pixels.
/// Returns `None` if nothing is hit (background).
///
/// Containers are never hit themselves: a click between the children of a
/// `<g>` lands on the background, as it does in a browser.
pub fn hit_test(
    doc: &SvgDocument,
    bounds: &HashMap<NodeIndex, Rect>,
    px: f64,
    py: f64,
) -> Option<NodeIndex> {
    let hit = hit_test_node(doc, doc.root, bounds, Point::new(px, py));
    log::trace!("hit_test({px}, {py}) -> {hit:?}");
    hit
}

fn hit_test_node(
    doc: &SvgDocument,
    idx: NodeIndex,
    bounds: &HashMap<NodeIndex, Rect>,
    point: Point,
) -> Option<NodeIndex> {
    let el = doc.element(idx)?;

    // Check children in reverse (last painted = topmost)
    for &child in doc.children(idx).iter().rev() {
        if let Some(hit) = hit_test_node(doc, child, bounds, point) {
            return Some(hit);
        }
    }

    if idx == doc.root || is_container(el.local_name()) {
        return None;
    }

    // Elements without a resolved box are not rendered.
    bounds
        .get(&idx)
        .filter(|b| contains_inclusive(b, point))
        .map(|_| idx)
}

/// Point-in-rect including the far edges, so zero-width lines stay clickable.
fn contains_inclusive(rect: &Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

/// Walk up from a raw hit target (inclusive) to the first element that
/// answers a geometry query, stopping before the root `<svg>`.
pub fn resolve_selection(doc: &SvgDocument, target: NodeIndex) -> Option<NodeIndex> {
    std::iter::once(target)
        .chain(doc.ancestors(target))
        .take_while(|&idx| idx != doc.root)
        .find(|&idx| {
            doc.element(idx)
                .is_some_and(|el| is_graphics_element(el.local_name()))
        })
}
