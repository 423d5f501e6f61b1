//! SVG document engine: arena model, sanitizer, parser, emitter, transforms,
//! styles and geometry.

pub mod config;
pub mod emitter;
pub mod geometry;
pub mod id;
pub mod model;
pub mod parser;
pub mod sanitize;
pub mod serialize;
pub mod style;
pub mod transform;

pub use config::EditorConfig;
pub use emitter::emit_document;
pub use geometry::{resolve_bounds, rendered_bbox};
pub use id::NodeId;
pub use model::*;
pub use parser::{ParseError, parse_svg};
pub use sanitize::sanitize;
pub use serialize::{SerializeError, serialize_document};
pub use transform::{BOOKKEEPING_ATTRS, Transform};

// Re-export geometry types so downstream crates don't need a direct dependency
pub use kurbo::{Affine, Point, Rect};
pub use petgraph::graph::NodeIndex;
