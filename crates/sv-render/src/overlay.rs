//! Selection overlay geometry.
//!
//! The overlay is positioned absolutely inside the scrollable viewport that
//! hosts the rendered document, so its rectangle is the selection's client
//! box minus the viewport's client origin plus the viewport's scroll offset.
//! It is derived on demand and never cached across mutations.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use sv_core::NodeIndex;
use sv_core::geometry::rendered_bbox;
use sv_core::model::SvgDocument;

/// One of the eight resize handles around the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Direction {
    /// Hit-test order: corners take precedence over edge midpoints.
    pub const ALL: [Direction; 8] = [
        Direction::NW,
        Direction::NE,
        Direction::SW,
        Direction::SE,
        Direction::N,
        Direction::S,
        Direction::W,
        Direction::E,
    ];

    /// `+1` when dragging right grows the box, `-1` when it shrinks it,
    /// `0` when this handle leaves the width alone.
    pub fn horizontal(self) -> f64 {
        match self {
            Direction::E | Direction::NE | Direction::SE => 1.0,
            Direction::W | Direction::NW | Direction::SW => -1.0,
            Direction::N | Direction::S => 0.0,
        }
    }

    /// Same as `horizontal`, for dragging down and the height.
    pub fn vertical(self) -> f64 {
        match self {
            Direction::S | Direction::SE | Direction::SW => 1.0,
            Direction::N | Direction::NE | Direction::NW => -1.0,
            Direction::E | Direction::W => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::N => "n",
            Direction::S => "s",
            Direction::E => "e",
            Direction::W => "w",
            Direction::NE => "ne",
            Direction::NW => "nw",
            Direction::SE => "se",
            Direction::SW => "sw",
        }
    }

    /// Where this handle sits on `rect`.
    fn anchor(self, rect: &OverlayRect) -> Point {
        let cx = rect.left + rect.width / 2.0;
        let cy = rect.top + rect.height / 2.0;
        let x = match self.horizontal() {
            h if h > 0.0 => rect.left + rect.width,
            h if h < 0.0 => rect.left,
            _ => cx,
        };
        let y = match self.vertical() {
            v if v > 0.0 => rect.top + rect.height,
            v if v < 0.0 => rect.top,
            _ => cy,
        };
        Point::new(x, y)
    }
}

// ─── Viewport ─────────────────────────────────────────────────────────────

/// The scrollable element hosting the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Client rect of the viewport element.
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Current scroll offsets.
    pub scroll_left: f64,
    pub scroll_top: f64,
    /// Offset of the document's top-left inside the scrolled content.
    pub content_x: f64,
    pub content_y: f64,
}

impl Viewport {
    /// Whether a client point lies inside the viewport element.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }

    /// Client point → document pixels.
    pub fn to_document(&self, x: f64, y: f64) -> Point {
        Point::new(
            x - self.left - self.content_x + self.scroll_left,
            y - self.top - self.content_y + self.scroll_top,
        )
    }

    /// Document pixels → client point.
    pub fn to_client(&self, p: Point) -> Point {
        Point::new(
            self.left + self.content_x - self.scroll_left + p.x,
            self.top + self.content_y - self.scroll_top + p.y,
        )
    }

    /// Client point → viewport content coordinates (the overlay's space).
    pub fn to_local(&self, x: f64, y: f64) -> Point {
        Point::new(x - self.left + self.scroll_left, y - self.top + self.scroll_top)
    }
}

// ─── Overlay ──────────────────────────────────────────────────────────────

/// The selection rectangle, in viewport content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// What part of the overlay a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayHit {
    Body,
    Handle(Direction),
}

impl OverlayRect {
    /// Which handle (if any) is under a point in viewport content
    /// coordinates. Handles are squares of `handle_size` centred on their
    /// anchor and win over the body.
    pub fn handle_at(&self, x: f64, y: f64, handle_size: f64) -> Option<OverlayHit> {
        let half = handle_size / 2.0;
        if let Some(dir) = Direction::ALL.into_iter().find(|d| {
            let a = d.anchor(self);
            (x - a.x).abs() <= half && (y - a.y).abs() <= half
        }) {
            return Some(OverlayHit::Handle(dir));
        }
        let inside = x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.height;
        inside.then_some(OverlayHit::Body)
    }
}

/// Recompute the overlay for `selection` inside `viewport`.
/// Returns `None` without a selection or when the node no longer renders.
pub fn recompute_overlay(
    doc: &SvgDocument,
    selection: Option<NodeIndex>,
    viewport: &Viewport,
) -> Option<OverlayRect> {
    let idx = selection?;
    let rect = overlay_for_bbox(rendered_bbox(doc, idx)?, viewport);
    log::trace!("overlay for {idx:?}: {rect:?}");
    Some(rect)
}

/// Place a rendered bounding box (document pixels) in the viewport.
pub fn overlay_for_bbox(bbox: Rect, viewport: &Viewport) -> OverlayRect {
    let client_origin = viewport.to_client(bbox.origin());
    OverlayRect {
        left: client_origin.x - viewport.left + viewport.scroll_left,
        top: client_origin.y - viewport.top + viewport.scroll_top,
        width: bbox.width(),
        height: bbox.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sv_core::parse_svg;

    fn viewport() -> Viewport {
        Viewport {
            left: 100.0,
            top: 50.0,
            width: 400.0,
            height: 300.0,
            scroll_left: 0.0,
            scroll_top: 0.0,
            content_x: 16.0,
            content_y: 16.0,
        }
    }

    #[test]
    fn overlay_is_in_content_space() {
        let doc = parse_svg(r#"<svg><rect id="r" x="10" y="20" width="30" height="40"/></svg>"#)
            .unwrap();
        let rect = doc.find_by_id_attr("r");
        let expected = OverlayRect {
            left: 26.0,
            top: 36.0,
            width: 30.0,
            height: 40.0,
        };
        assert_eq!(recompute_overlay(&doc, rect, &viewport()), Some(expected));

        // Scrolling moves the client box but not the overlay's content position.
        let scrolled = Viewport {
            scroll_left: 25.0,
            scroll_top: 60.0,
            ..viewport()
        };
        assert_eq!(recompute_overlay(&doc, rect, &scrolled), Some(expected));
    }

    #[test]
    fn no_selection_no_overlay() {
        let doc = parse_svg("<svg/>").unwrap();
        assert_eq!(recompute_overlay(&doc, None, &viewport()), None);
    }

    #[test]
    fn coordinate_conversions_agree() {
        let vp = Viewport {
            scroll_left: 30.0,
            scroll_top: 5.0,
            ..viewport()
        };
        let p = Point::new(12.0, 34.0);
        let client = vp.to_client(p);
        assert_eq!(vp.to_document(client.x, client.y), p);
        let local = vp.to_local(client.x, client.y);
        assert_eq!(local, Point::new(p.x + vp.content_x, p.y + vp.content_y));
        assert!(vp.contains(100.0, 50.0));
        assert!(!vp.contains(500.0, 50.0));
    }

    #[test]
    fn handles_then_body() {
        let rect = OverlayRect {
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(rect.handle_at(1.0, -2.0, 10.0), Some(OverlayHit::Handle(Direction::NW)));
        assert_eq!(rect.handle_at(100.0, 50.0, 10.0), Some(OverlayHit::Handle(Direction::SE)));
        assert_eq!(rect.handle_at(50.0, 0.0, 10.0), Some(OverlayHit::Handle(Direction::N)));
        assert_eq!(rect.handle_at(103.0, 25.0, 10.0), Some(OverlayHit::Handle(Direction::E)));
        assert_eq!(rect.handle_at(30.0, 20.0, 10.0), Some(OverlayHit::Body));
        assert_eq!(rect.handle_at(130.0, 20.0, 10.0), None);
    }

    #[test]
    fn tiny_boxes_prefer_corners() {
        let rect = OverlayRect {
            left: 0.0,
            top: 0.0,
            width: 2.0,
            height: 2.0,
        };
        assert_eq!(rect.handle_at(1.0, 1.0, 10.0), Some(OverlayHit::Handle(Direction::NW)));
    }

    #[test]
    fn direction_signs() {
        assert_eq!((Direction::SE.horizontal(), Direction::SE.vertical()), (1.0, 1.0));
        assert_eq!((Direction::NW.horizontal(), Direction::NW.vertical()), (-1.0, -1.0));
        assert_eq!((Direction::N.horizontal(), Direction::N.vertical()), (0.0, -1.0));
        assert_eq!(Direction::SW.as_str(), "sw");
    }
}
