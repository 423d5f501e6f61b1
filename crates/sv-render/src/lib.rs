//! Hit testing, selection resolution and overlay geometry.

pub mod hit;
pub mod overlay;

pub use hit::{hit_test, resolve_selection};
pub use overlay::{
    Direction, OverlayHit, OverlayRect, Viewport, overlay_for_bbox, recompute_overlay,
};
