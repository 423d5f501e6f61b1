//! Input abstraction layer.
//!
//! Pointer events arrive from the shell in client coordinates (the same
//! space as `Viewport::left`/`top`).

use serde::Deserialize;

/// A normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f64, y: f64 },

    /// Pointer moved while the page has focus.
    PointerMove { x: f64, y: f64 },

    /// Pointer released.
    PointerUp { x: f64, y: f64 },
}

impl InputEvent {
    /// Extract the client position.
    pub fn position(&self) -> (f64, f64) {
        match *self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                (x, y)
            }
        }
    }
}
