//! Editor settings shared by the session, the wasm bridge and the CLI.

use serde::{Deserialize, Serialize};

/// Configuration for an editing session.
///
/// Every field has a default, so partial JSON (`{"edit_mode": true}`) is a
/// valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether clicks select nodes when the session starts. Default: **false**.
    pub edit_mode: bool,

    /// Re-serialize the live tree into canonical text after gestures and
    /// field edits. Default: **true**.
    pub auto_rewrite: bool,

    /// Quiet period after the last field edit before the debounced
    /// serializer pass runs, in milliseconds. Default: **150**.
    pub debounce_ms: u64,

    /// Smallest per-axis scale a resize gesture may produce, as a fraction
    /// of the scale at gesture start. Default: **0.05**.
    pub min_scale_ratio: f64,

    /// Side length of the overlay's resize handles in pixels. Default: **10**.
    pub handle_size: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            edit_mode: false,
            auto_rewrite: true,
            debounce_ms: 150,
            min_scale_ratio: 0.05,
            handle_size: 10.0,
        }
    }
}
