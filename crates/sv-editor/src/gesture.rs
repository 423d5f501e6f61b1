//! Move/resize gesture state machine.
//!
//! ```text
//!            down on body             up / cancel
//!   Idle ─────────────────▶ Moving ──────────────▶ Idle
//!     │      down on handle d              up / cancel
//!     └───────────────────▶ Resizing(d) ───────────▶ Idle
//! ```
//!
//! Every pointer-move is evaluated against what was captured at pointer-down
//! (pointer position, transform, bounding box), never against the previous
//! move, so rounding cannot accumulate over a long drag.

use kurbo::{Affine, Point, Rect};
use sv_core::NodeIndex;
use sv_core::transform::Transform;
use sv_render::{Direction, OverlayHit};

/// Bounding boxes narrower than this cannot anchor a resize ratio.
const DEGENERATE_SIZE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Moving,
    Resizing(Direction),
}

/// What was captured when the gesture started.
#[derive(Debug, Clone, Copy)]
struct GestureStart {
    node: NodeIndex,
    pointer: Point,
    transform: Transform,
    bbox: Rect,
    /// Maps a client-pixel delta into the node's parent user space.
    delta_to_parent: Affine,
}

#[derive(Debug, Default)]
pub struct GestureController {
    state: GestureState,
    start: Option<GestureStart>,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != GestureState::Idle
    }

    /// The node under the active gesture.
    pub fn target(&self) -> Option<NodeIndex> {
        self.start.map(|s| s.node)
    }

    /// Start a gesture from a pointer-down on the overlay.
    ///
    /// `parent_ctm` is the node's parent-to-document map; its linear part is
    /// inverted so pointer deltas translate the node by what the user sees.
    /// Returns `false`, leaving the active gesture untouched, if one is
    /// already running.
    pub fn begin(
        &mut self,
        hit: OverlayHit,
        node: NodeIndex,
        pointer: Point,
        transform: Transform,
        bbox: Rect,
        parent_ctm: Affine,
    ) -> bool {
        if self.is_active() {
            log::debug!("pointer-down ignored: gesture {:?} in progress", self.state);
            return false;
        }
        let [a, b, c, d, _, _] = parent_ctm.as_coeffs();
        let linear = Affine::new([a, b, c, d, 0.0, 0.0]);
        let delta_to_parent = if linear.determinant().abs() > DEGENERATE_SIZE {
            linear.inverse()
        } else {
            Affine::IDENTITY
        };
        self.state = match hit {
            OverlayHit::Body => GestureState::Moving,
            OverlayHit::Handle(dir) => GestureState::Resizing(dir),
        };
        self.start = Some(GestureStart {
            node,
            pointer,
            transform,
            bbox,
            delta_to_parent,
        });
        log::debug!("gesture start: {:?} on {node:?}", self.state);
        true
    }

    /// The transform the target should have with the pointer at `pointer`.
    pub fn update(&self, pointer: Point, min_scale_ratio: f64) -> Option<(NodeIndex, Transform)> {
        let start = self.start?;
        let delta = pointer - start.pointer;
        let t = match self.state {
            GestureState::Idle => return None,
            GestureState::Moving => {
                let local = start.delta_to_parent * delta.to_point();
                Transform {
                    tx: start.transform.tx + local.x,
                    ty: start.transform.ty + local.y,
                    ..start.transform
                }
            }
            GestureState::Resizing(dir) => Transform {
                sx: resize_scale(
                    start.transform.sx,
                    start.bbox.width(),
                    delta.x,
                    dir.horizontal(),
                    min_scale_ratio,
                ),
                sy: resize_scale(
                    start.transform.sy,
                    start.bbox.height(),
                    delta.y,
                    dir.vertical(),
                    min_scale_ratio,
                ),
                ..start.transform
            },
        };
        Some((start.node, t))
    }

    /// Finish the gesture, returning the node it was acting on.
    pub fn end(&mut self) -> Option<NodeIndex> {
        let node = self.target();
        if node.is_some() {
            log::debug!("gesture end: {:?}", self.state);
        }
        self.cancel();
        node
    }

    /// Drop any gesture in flight without a final write.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
        self.start = None;
    }
}

/// New scale for one axis of a resize.
///
/// `sign` is `+1` when a positive delta grows this axis, `-1` when it
/// shrinks it, `0` when the handle does not touch the axis. The size ratio is
/// floored at `min_ratio` so the node can never collapse or flip.
pub fn resize_scale(start_scale: f64, start_size: f64, delta: f64, sign: f64, min_ratio: f64) -> f64 {
    if sign == 0.0 || start_size.abs() < DEGENERATE_SIZE {
        return start_scale;
    }
    let ratio = (start_size + sign * delta) / start_size;
    start_scale * ratio.max(min_ratio)
}
