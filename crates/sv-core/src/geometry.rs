//! Bounding boxes and coordinate transforms for the document arena.
//!
//! `local_bbox` answers the geometry query of a single element in its own
//! user space (before its own `transform`). `resolve_bounds` walks the whole
//! tree once and returns the rendered box of every graphics element in
//! document pixels, i.e. after the root viewBox mapping.

use crate::model::{
    SvgDocument, is_container, is_graphics_element, is_non_rendered_container, is_text_bearing,
};
use crate::style::{computed_value, presentation_value};
use crate::transform::parse_affine;
use kurbo::{Affine, BezPath, Point, Rect, Shape, Size};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

/// Viewport size browsers fall back to when the root gives none.
pub const DEFAULT_VIEWPORT: Size = Size::new(300.0, 150.0);

const DEFAULT_FONT_SIZE: f64 = 16.0;
const GLYPH_ADVANCE: f64 = 0.6;
const ASCENT: f64 = 0.8;
const DESCENT: f64 = 0.2;

// ─── Lengths ─────────────────────────────────────────────────────────────

/// Parse a length with an optional unit into user units (CSS pixels).
/// Percentages resolve to 0; unknown units and garbage yield `None`.
pub fn parse_length(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| (c.is_ascii_alphabetic() && c != 'e' && c != 'E') || c == '%')
        .unwrap_or(raw.len());
    // An exponent marker followed by a unit (`2em`, `3ex`) belongs to the unit.
    let (number, unit) = match raw.get(..split) {
        Some(n)
            if (n.ends_with('e') || n.ends_with('E'))
                && (raw[split..].starts_with('m') || raw[split..].starts_with('x')) =>
        {
            raw.split_at(split - 1)
        }
        _ => raw.split_at(split),
    };
    let value: f64 = number.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
    let factor = match unit.trim() {
        "" | "px" => 1.0,
        "pt" => 96.0 / 72.0,
        "pc" => 16.0,
        "mm" => 96.0 / 25.4,
        "cm" => 96.0 / 2.54,
        "in" => 96.0,
        "em" => DEFAULT_FONT_SIZE,
        "ex" => DEFAULT_FONT_SIZE / 2.0,
        "%" => 0.0,
        _ => return None,
    };
    Some(value * factor)
}

fn length_attr(doc: &SvgDocument, idx: NodeIndex, name: &str) -> f64 {
    doc.element(idx)
        .and_then(|el| el.attr(name))
        .and_then(|v| v.split(|c: char| c.is_whitespace() || c == ',').find(|s| !s.is_empty()))
        .and_then(parse_length)
        .unwrap_or(0.0)
}

fn number_list(raw: &str) -> Vec<f64> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map_while(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

// ─── Transforms ──────────────────────────────────────────────────────────

/// The element's own `transform` attribute as an affine map.
pub fn node_transform(doc: &SvgDocument, idx: NodeIndex) -> Affine {
    doc.element(idx)
        .and_then(|el| el.attr("transform"))
        .map_or(Affine::IDENTITY, parse_affine)
}

/// Size of the root viewport in CSS pixels.
pub fn viewport_size(doc: &SvgDocument) -> Size {
    let view_box = root_view_box(doc);
    let attr = |name: &str| {
        doc.root_element()
            .and_then(|el| el.attr(name))
            .and_then(parse_length)
            .filter(|v| *v > 0.0)
    };
    match (attr("width"), attr("height"), view_box) {
        (Some(w), Some(h), _) => Size::new(w, h),
        (Some(w), None, Some(vb)) if vb.width() > 0.0 => {
            Size::new(w, w * vb.height() / vb.width())
        }
        (None, Some(h), Some(vb)) if vb.height() > 0.0 => {
            Size::new(h * vb.width() / vb.height(), h)
        }
        (None, None, Some(vb)) => vb.size(),
        (w, h, _) => Size::new(
            w.unwrap_or(DEFAULT_VIEWPORT.width),
            h.unwrap_or(DEFAULT_VIEWPORT.height),
        ),
    }
}

fn root_view_box(doc: &SvgDocument) -> Option<Rect> {
    let raw = doc.root_element()?.attr("viewBox")?;
    match number_list(raw).as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some(Rect::new(*x, *y, x + w, y + h)),
        _ => None,
    }
}

/// Map from root user space to document pixels (viewBox + preserveAspectRatio).
pub fn view_transform(doc: &SvgDocument) -> Affine {
    let Some(vb) = root_view_box(doc) else {
        return Affine::IDENTITY;
    };
    let size = viewport_size(doc);
    let sx = size.width / vb.width();
    let sy = size.height / vb.height();

    let par = doc
        .root_element()
        .and_then(|el| el.attr("preserveAspectRatio"))
        .unwrap_or("xMidYMid meet");
    let mut parts = par.split_whitespace();
    let align = parts.next().unwrap_or("xMidYMid");
    let slice = parts.next() == Some("slice");

    if align == "none" {
        return Affine::scale_non_uniform(sx, sy) * Affine::translate((-vb.x0, -vb.y0));
    }

    let scale = if slice { sx.max(sy) } else { sx.min(sy) };
    let extra_w = size.width - vb.width() * scale;
    let extra_h = size.height - vb.height() * scale;
    let offset_x = if align.contains("xMid") {
        extra_w / 2.0
    } else if align.contains("xMax") {
        extra_w
    } else {
        0.0
    };
    let offset_y = if align.contains("YMid") {
        extra_h / 2.0
    } else if align.contains("YMax") {
        extra_h
    } else {
        0.0
    };
    Affine::translate((offset_x, offset_y))
        * Affine::scale(scale)
        * Affine::translate((-vb.x0, -vb.y0))
}

/// Full map from the element's local user space to document pixels.
pub fn screen_ctm(doc: &SvgDocument, idx: NodeIndex) -> Affine {
    parent_ctm(doc, idx) * node_transform(doc, idx)
}

/// The map applied to the element's `transform` attribute: everything above it.
pub fn parent_ctm(doc: &SvgDocument, idx: NodeIndex) -> Affine {
    doc.ancestors(idx)
        .iter()
        .rev()
        .fold(view_transform(doc), |acc, &a| acc * node_transform(doc, a))
}

// ─── Visibility ──────────────────────────────────────────────────────────

fn hides_subtree(doc: &SvgDocument, idx: NodeIndex) -> bool {
    doc.element(idx).is_some_and(|el| {
        is_non_rendered_container(el.local_name())
            || presentation_value(el, "display") == Some("none")
    })
}

/// Whether the element paints: no `display="none"` and no non-rendered
/// container (`defs`, `clipPath`, ...) on itself or any ancestor.
pub fn is_rendered(doc: &SvgDocument, idx: NodeIndex) -> bool {
    doc.element(idx).is_some()
        && !std::iter::once(idx)
            .chain(doc.ancestors(idx))
            .any(|i| hides_subtree(doc, i))
}

// ─── Bounding boxes ──────────────────────────────────────────────────────

/// Bounding box of an element in its own user space.
pub fn local_bbox(doc: &SvgDocument, idx: NodeIndex) -> Option<Rect> {
    BoxPass::new(doc).local(idx)
}

/// Box state shared by one query or one whole-tree walk.
///
/// Each element's local box is computed at most once per pass, so `<use>`
/// fan-out costs one lookup per reference instead of re-walking the target.
struct BoxPass<'a> {
    doc: &'a SvgDocument,
    /// `id` attribute to element, built on the first `<use>`.
    ids: Option<HashMap<&'a str, NodeIndex>>,
    boxes: HashMap<NodeIndex, Option<Rect>>,
    resolving: HashSet<NodeIndex>,
}

impl<'a> BoxPass<'a> {
    fn new(doc: &'a SvgDocument) -> Self {
        Self {
            doc,
            ids: None,
            boxes: HashMap::new(),
            resolving: HashSet::new(),
        }
    }

    fn local(&mut self, idx: NodeIndex) -> Option<Rect> {
        if let Some(&cached) = self.boxes.get(&idx) {
            return cached;
        }
        if !self.resolving.insert(idx) {
            log::debug!("reference cycle through {:?}", self.doc.id_of(idx));
            return None;
        }
        let bbox = self.compute(idx);
        self.resolving.remove(&idx);
        self.boxes.insert(idx, bbox);
        bbox
    }

    fn compute(&mut self, idx: NodeIndex) -> Option<Rect> {
        let doc = self.doc;
        let el = doc.element(idx)?;
        let len = |name: &str| length_attr(doc, idx, name);
        match el.local_name() {
            "rect" | "image" | "foreignObject" => Some(Rect::from_origin_size(
                (len("x"), len("y")),
                (len("width").max(0.0), len("height").max(0.0)),
            )),
            "circle" => {
                let r = len("r").max(0.0);
                Some(Rect::from_center_size((len("cx"), len("cy")), (2.0 * r, 2.0 * r)))
            }
            "ellipse" => {
                let (rx, ry) = (len("rx").max(0.0), len("ry").max(0.0));
                Some(Rect::from_center_size((len("cx"), len("cy")), (2.0 * rx, 2.0 * ry)))
            }
            "line" => Some(Rect::from_points(
                (len("x1"), len("y1")),
                (len("x2"), len("y2")),
            )),
            "polyline" | "polygon" => {
                let coords = number_list(el.attr("points")?);
                let mut points = coords.chunks_exact(2).map(|p| Point::new(p[0], p[1]));
                let first = points.next()?;
                Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
            }
            "path" => {
                let path = BezPath::from_svg(el.attr("d")?).ok()?;
                if path.elements().is_empty() {
                    return None;
                }
                Some(path.bounding_box())
            }
            "use" => {
                let href = el.attr("href").or_else(|| el.attr("xlink:href"))?;
                let target = self.by_id(href.strip_prefix('#')?)?;
                // A reference to itself or an enclosing element never renders.
                if target == idx || doc.ancestors(idx).contains(&target) {
                    log::debug!("use {:?} references its own ancestor", doc.id_of(idx));
                    return None;
                }
                let inner = self.local(target)?;
                let placed = Affine::translate((len("x"), len("y"))) * node_transform(doc, target);
                Some(placed.transform_rect_bbox(inner))
            }
            name if is_text_bearing(name) => text_bbox(doc, idx),
            name if is_container(name) => self.children(idx),
            _ => None,
        }
    }

    fn children(&mut self, idx: NodeIndex) -> Option<Rect> {
        let doc = self.doc;
        let mut union: Option<Rect> = None;
        for &c in doc.children(idx) {
            let paints = doc
                .element(c)
                .is_some_and(|el| is_graphics_element(el.local_name()))
                && !hides_subtree(doc, c);
            if !paints {
                continue;
            }
            if let Some(b) = self.local(c) {
                let b = node_transform(doc, c).transform_rect_bbox(b);
                union = Some(union.map_or(b, |u| u.union(b)));
            }
        }
        union
    }

    fn by_id(&mut self, value: &str) -> Option<NodeIndex> {
        let doc = self.doc;
        let ids = self.ids.get_or_insert_with(|| {
            let mut ids = HashMap::new();
            for idx in doc.elements() {
                if let Some(id) = doc.element(idx).and_then(|el| el.attr("id")) {
                    // First occurrence wins, as with getElementById.
                    ids.entry(id).or_insert(idx);
                }
            }
            ids
        });
        ids.get(value).copied()
    }
}

/// Approximate text metrics: fixed advance per character, ascent/descent as
/// fractions of the font size, positioned by `x`/`y` and `text-anchor`.
fn text_bbox(doc: &SvgDocument, idx: NodeIndex) -> Option<Rect> {
    let font_size = computed_value(doc, idx, "font-size")
        .as_deref()
        .and_then(parse_length)
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE);

    // A tspan without its own position continues from its text element.
    let origin_of = |i: NodeIndex| {
        let el = doc.element(i)?;
        (el.has_attr("x") || el.has_attr("y"))
            .then(|| Point::new(length_attr(doc, i, "x"), length_attr(doc, i, "y")))
    };
    let origin = origin_of(idx)
        .or_else(|| {
            doc.ancestors(idx)
                .into_iter()
                .take_while(|&a| doc.element(a).is_some_and(|el| is_text_bearing(el.local_name())))
                .find_map(origin_of)
        })
        .unwrap_or(Point::ORIGIN);

    let chars = doc.text_content(idx).chars().count() as f64;
    let width = chars * GLYPH_ADVANCE * font_size;
    let start = match computed_value(doc, idx, "text-anchor").as_deref() {
        Some("middle") => origin.x - width / 2.0,
        Some("end") => origin.x - width,
        _ => origin.x,
    };
    Some(Rect::new(
        start,
        origin.y - ASCENT * font_size,
        start + width,
        origin.y + DESCENT * font_size,
    ))
}

/// Rendered box of a single element in document pixels.
pub fn rendered_bbox(doc: &SvgDocument, idx: NodeIndex) -> Option<Rect> {
    if !is_rendered(doc, idx) {
        return None;
    }
    let local = local_bbox(doc, idx)?;
    Some(screen_ctm(doc, idx).transform_rect_bbox(local))
}

/// Rendered boxes of every rendered graphics element below the root.
pub fn resolve_bounds(doc: &SvgDocument) -> HashMap<NodeIndex, Rect> {
    let mut pass = BoxPass::new(doc);
    let mut bounds = HashMap::new();
    let root_ctm = view_transform(doc) * node_transform(doc, doc.root);
    for &child in doc.children(doc.root) {
        collect_bounds(&mut pass, child, root_ctm, &mut bounds);
    }
    log::trace!("resolved {} bounding boxes", bounds.len());
    bounds
}

fn collect_bounds(
    pass: &mut BoxPass<'_>,
    idx: NodeIndex,
    parent_ctm: Affine,
    bounds: &mut HashMap<NodeIndex, Rect>,
) {
    let doc = pass.doc;
    let Some(el) = doc.element(idx) else {
        return;
    };
    if !is_graphics_element(el.local_name()) || hides_subtree(doc, idx) {
        return;
    }
    let ctm = parent_ctm * node_transform(doc, idx);
    if let Some(local) = pass.local(idx) {
        bounds.insert(idx, ctm.transform_rect_bbox(local));
    }
    for &child in doc.children(idx) {
        collect_bounds(pass, child, ctm, bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_svg;
    use pretty_assertions::assert_eq;

    fn first(doc: &SvgDocument, name: &str) -> NodeIndex {
        doc.elements()
            .into_iter()
            .find(|&i| doc.element(i).unwrap().local_name() == name)
            .unwrap()
    }

    fn approx(a: Rect, b: Rect) {
        let close = |x: f64, y: f64| (x - y).abs() < 1e-6;
        assert!(
            close(a.x0, b.x0) && close(a.y0, b.y0) && close(a.x1, b.x1) && close(a.y1, b.y1),
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn lengths_with_units() {
        assert_eq!(parse_length("10"), Some(10.0));
        assert_eq!(parse_length(" 12px "), Some(12.0));
        assert_eq!(parse_length("1in"), Some(96.0));
        assert_eq!(parse_length("2em"), Some(32.0));
        assert_eq!(parse_length("1ex"), Some(8.0));
        assert_eq!(parse_length("1e1"), Some(10.0));
        assert_eq!(parse_length("50%"), Some(0.0));
        assert_eq!(parse_length("wide"), None);
        assert_eq!(parse_length("3furlongs"), None);
    }

    #[test]
    fn basic_shapes() {
        let doc = parse_svg(
            r#"<svg><rect x="5" y="6" width="10" height="20"/><circle cx="50" cy="50" r="5"/><ellipse cx="0" cy="0" rx="4" ry="2"/><line x1="10" y1="0" x2="0" y2="10"/><polygon points="0,0 10,5 5,15"/><path d="M10 10 L30 10 L30 40 Z"/></svg>"#,
        )
        .unwrap();
        approx(local_bbox(&doc, first(&doc, "rect")).unwrap(), Rect::new(5.0, 6.0, 15.0, 26.0));
        approx(local_bbox(&doc, first(&doc, "circle")).unwrap(), Rect::new(45.0, 45.0, 55.0, 55.0));
        approx(local_bbox(&doc, first(&doc, "ellipse")).unwrap(), Rect::new(-4.0, -2.0, 4.0, 2.0));
        approx(local_bbox(&doc, first(&doc, "line")).unwrap(), Rect::new(0.0, 0.0, 10.0, 10.0));
        approx(local_bbox(&doc, first(&doc, "polygon")).unwrap(), Rect::new(0.0, 0.0, 10.0, 15.0));
        approx(local_bbox(&doc, first(&doc, "path")).unwrap(), Rect::new(10.0, 10.0, 30.0, 40.0));
    }

    #[test]
    fn text_metrics_follow_font_size_and_anchor() {
        let doc = parse_svg(
            r#"<svg><text x="100" y="50" font-size="10" text-anchor="middle">abcd</text></svg>"#,
        )
        .unwrap();
        approx(
            local_bbox(&doc, first(&doc, "text")).unwrap(),
            Rect::new(88.0, 42.0, 112.0, 52.0),
        );
    }

    #[test]
    fn group_bbox_is_union_of_transformed_children() {
        let doc = parse_svg(
            r#"<svg><g><rect width="10" height="10"/><rect width="10" height="10" transform="translate(20, 5)"/></g></svg>"#,
        )
        .unwrap();
        approx(local_bbox(&doc, first(&doc, "g")).unwrap(), Rect::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn use_resolves_reference() {
        let doc = parse_svg(
            r##"<svg><defs><circle id="dot" r="2"/></defs><use href="#dot" x="10" y="10"/><use href="#self" id="self"/></svg>"##,
        )
        .unwrap();
        let uses: Vec<_> = doc
            .elements()
            .into_iter()
            .filter(|&i| doc.element(i).unwrap().name == "use")
            .collect();
        approx(local_bbox(&doc, uses[0]).unwrap(), Rect::new(8.0, 8.0, 12.0, 12.0));
        assert_eq!(local_bbox(&doc, uses[1]), None);
    }

    #[test]
    fn use_inside_its_own_target_is_skipped() {
        let uses = r##"<use href="#a"/>"##.repeat(6);
        let doc = parse_svg(&format!(
            r#"<svg><g id="a"><rect width="1" height="1"/>{uses}</g></svg>"#
        ))
        .unwrap();
        let bounds = resolve_bounds(&doc);
        assert_eq!(bounds.len(), 2);
        approx(bounds[&first(&doc, "g")], Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(rendered_bbox(&doc, first(&doc, "use")), None);
    }

    #[test]
    fn wide_use_chains_resolve_each_target_once() {
        // Eight levels of six references each: 6^8 walks without sharing.
        let mut markup = String::from(r#"<svg><g id="l0"><rect width="1" height="1"/></g>"#);
        for level in 1..=8 {
            let refs = format!(r##"<use href="#l{}" x="1"/>"##, level - 1).repeat(6);
            markup.push_str(&format!(r#"<g id="l{level}">{refs}</g>"#));
        }
        markup.push_str("</svg>");
        let doc = parse_svg(&markup).unwrap();

        let bounds = resolve_bounds(&doc);
        assert_eq!(bounds.len(), 2 + 8 * 7);
        let top = doc.find_by_id_attr("l8").unwrap();
        approx(bounds[&top], Rect::new(8.0, 0.0, 9.0, 1.0));
        approx(local_bbox(&doc, top).unwrap(), Rect::new(8.0, 0.0, 9.0, 1.0));
    }

    #[test]
    fn mutual_use_cycle_terminates() {
        let doc = parse_svg(
            r##"<svg><g id="a"><use href="#b"/></g><g id="b"><use href="#a"/><rect width="2" height="2"/></g></svg>"##,
        )
        .unwrap();
        let bounds = resolve_bounds(&doc);
        approx(
            bounds[&doc.find_by_id_attr("b").unwrap()],
            Rect::new(0.0, 0.0, 2.0, 2.0),
        );
    }

    #[test]
    fn view_box_scales_to_viewport() {
        let doc = parse_svg(
            r#"<svg width="200" height="100" viewBox="0 0 100 100"><rect x="0" y="0" width="100" height="100"/></svg>"#,
        )
        .unwrap();
        // meet: uniform scale 1, centred horizontally.
        let bounds = resolve_bounds(&doc);
        approx(bounds[&first(&doc, "rect")], Rect::new(50.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn preserve_aspect_ratio_none_stretches() {
        let doc = parse_svg(
            r#"<svg width="200" height="100" viewBox="0 0 100 100" preserveAspectRatio="none"><rect width="100" height="100"/></svg>"#,
        )
        .unwrap();
        approx(
            rendered_bbox(&doc, first(&doc, "rect")).unwrap(),
            Rect::new(0.0, 0.0, 200.0, 100.0),
        );
    }

    #[test]
    fn ctm_composes_ancestors() {
        let doc = parse_svg(
            r#"<svg><g transform="translate(10, 10)"><g transform="scale(2)"><rect x="1" y="1" width="5" height="5" transform="translate(1, 0)"/></g></g></svg>"#,
        )
        .unwrap();
        let rect = first(&doc, "rect");
        approx(rendered_bbox(&doc, rect).unwrap(), Rect::new(14.0, 12.0, 24.0, 22.0));
        let p = parent_ctm(&doc, rect) * Point::new(1.0, 1.0);
        assert!((p.x - 12.0).abs() < 1e-9 && (p.y - 12.0).abs() < 1e-9);
    }

    #[test]
    fn hidden_content_is_not_resolved() {
        let doc = parse_svg(
            r#"<svg><defs><rect width="5" height="5"/></defs><g display="none"><circle r="3"/></g><rect width="1" height="1" style="display: none"/><ellipse rx="1" ry="1"/></svg>"#,
        )
        .unwrap();
        let bounds = resolve_bounds(&doc);
        assert_eq!(bounds.len(), 1);
        assert!(bounds.contains_key(&first(&doc, "ellipse")));
        assert!(!is_rendered(&doc, first(&doc, "circle")));
    }

    #[test]
    fn viewport_size_fallbacks() {
        let doc = parse_svg(r#"<svg viewBox="0 0 40 20"/>"#).unwrap();
        assert_eq!(viewport_size(&doc), Size::new(40.0, 20.0));
        let doc = parse_svg(r#"<svg width="80" viewBox="0 0 40 20"/>"#).unwrap();
        assert_eq!(viewport_size(&doc), Size::new(80.0, 40.0));
        let doc = parse_svg("<svg/>").unwrap();
        assert_eq!(viewport_size(&doc), DEFAULT_VIEWPORT);
    }
}
