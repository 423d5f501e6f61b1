//! WASM bridge for the SVG viewer: exposes the editing session to the
//! browser shell.
//!
//! Built with `wasm-pack build --target web`. Structured results cross the
//! boundary as JSON strings; the shell owns the DOM, the clipboard, and
//! download links.

use serde::Serialize;
use sv_core::{EditorConfig, NodeId};
use sv_editor::{EditorSession, FONT_PRESETS, Field, InputEvent, Notification, SerializeOutcome};
use sv_render::Viewport;
use wasm_bindgen::prelude::*;

/// The viewer controller held by the page.
#[wasm_bindgen]
pub struct SvgViewer {
    session: EditorSession,
}

#[wasm_bindgen]
impl SvgViewer {
    /// Create a viewer. `config_json` may set any subset of the editor
    /// settings; unknown or malformed input falls back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Self {
        console_error_panic_hook_setup();

        let config = config_json
            .as_deref()
            .map(|json| {
                serde_json::from_str::<EditorConfig>(json).unwrap_or_else(|e| {
                    log::warn!("ignoring malformed config: {e}");
                    EditorConfig::default()
                })
            })
            .unwrap_or_default();
        Self {
            session: EditorSession::new(config),
        }
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Load an uploaded or dropped file. Returns the notification JSON.
    pub fn load_file(&mut self, mime: &str, text: &str) -> String {
        let result = self.session.load_file(mime, text);
        to_json(&Notification::from_load(&result), "{}")
    }

    /// Load pasted markup. Returns the notification JSON.
    pub fn load_pasted(&mut self, text: &str) -> String {
        let result = self.session.load_from_pasted_text(text);
        to_json(&Notification::from_load(&result), "{}")
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_loaded()
    }

    /// The canonical markup for the code view and the rendered view.
    pub fn get_text(&self) -> String {
        self.session.canonical_text().to_string()
    }

    // ─── Modes ───────────────────────────────────────────────────────────

    pub fn set_edit_mode(&mut self, on: bool) {
        self.session.set_edit_mode(on);
    }

    pub fn set_auto_rewrite(&mut self, on: bool) {
        self.session.set_auto_rewrite(on);
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Client rect of the scrollable element hosting the document, plus the
    /// document's offset inside the scrolled content.
    #[allow(clippy::too_many_arguments)]
    pub fn set_viewport(
        &mut self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        scroll_left: f64,
        scroll_top: f64,
        content_x: f64,
        content_y: f64,
    ) {
        self.session.set_viewport(Viewport {
            left,
            top,
            width,
            height,
            scroll_left,
            scroll_top,
            content_x,
            content_y,
        });
    }

    pub fn scroll_to(&mut self, scroll_left: f64, scroll_top: f64) {
        self.session.scroll_to(scroll_left, scroll_top);
    }

    // ─── Pointer input ───────────────────────────────────────────────────
    //
    // Each handler returns `true` when the canonical text was rewritten.

    pub fn handle_pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.rewrites_during(|s| s.pointer_down(x, y))
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.rewrites_during(|s| s.pointer_move(x, y))
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.rewrites_during(|s| s.pointer_up(x, y))
    }

    /// Handle one `{"type": "pointerDown", "x": .., "y": ..}` event.
    pub fn handle_event_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<InputEvent>(json) {
            Ok(event) => self.rewrites_during(|s| s.handle_input(&event)),
            Err(e) => {
                log::warn!("bad input event: {e}");
                false
            }
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node by the id reported in `get_selectable_nodes_json`.
    pub fn select_node(&mut self, id: &str) -> bool {
        NodeId::lookup(id).is_some_and(|id| self.session.select(id))
    }

    pub fn deselect(&mut self) {
        self.session.deselect();
    }

    /// The selected node's id, or `""`.
    pub fn get_selected_id(&self) -> String {
        self.session
            .selected_id()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    /// `{"left":..,"top":..,"width":..,"height":..}` or `null`.
    pub fn get_overlay_json(&self) -> String {
        to_json(&self.session.overlay(), "null")
    }

    /// Inspector fields for the selection, or `null`.
    pub fn get_fields_json(&self) -> String {
        to_json(&self.session.fields(), "null")
    }

    pub fn get_font_presets_json(&self) -> String {
        to_json(&FONT_PRESETS, "[]")
    }

    /// Every rendered, selectable node with its overlay box.
    pub fn get_selectable_nodes_json(&self) -> String {
        to_json(&self.session.selectable_nodes(), "[]")
    }

    // ─── Field edits ─────────────────────────────────────────────────────

    /// Apply an inspector edit. `field` is one of `text`, `fill`, `stroke`,
    /// `fontSize`, `fontFamily`.
    pub fn edit_field(&mut self, field: &str, value: &str) -> bool {
        match field.parse::<Field>() {
            Ok(field) => self.session.edit_field(field, value, now_ms()),
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    /// Drive the debounced serializer. Call from a timer or animation frame;
    /// returns `true` when the canonical text was rewritten.
    pub fn tick(&mut self) -> bool {
        self.session.tick(now_ms())
    }

    pub fn has_pending_rewrite(&self) -> bool {
        self.session.has_pending_rewrite()
    }

    /// Serialize now. Returns `false` when nothing is loaded or the pass
    /// failed (the previous text is kept).
    pub fn rewrite_now(&mut self) -> bool {
        self.session.rewrite_now() == SerializeOutcome::Committed
    }

    // ─── Outputs ─────────────────────────────────────────────────────────

    /// `{"text":..,"notification":{..}}` for the clipboard, or `null`.
    pub fn copy_json(&self) -> String {
        #[derive(Serialize)]
        struct Clipboard<'a> {
            text: &'a str,
            notification: Notification,
        }
        let copy = self
            .session
            .copy_text()
            .map(|(text, notification)| Clipboard { text, notification });
        to_json(&copy, "null")
    }

    /// `{"file_name":"image.svg","mime":..,"contents":..}`, or `null`.
    pub fn export_json(&self) -> String {
        to_json(&self.session.export(), "null")
    }
}

impl SvgViewer {
    fn rewrites_during(&mut self, f: impl FnOnce(&mut EditorSession)) -> bool {
        let before = self.session.serialization_count();
        f(&mut self.session);
        self.session.serialization_count() != before
    }
}

/// Sanitize markup without loading it. Returns `""` when no `<svg>` root
/// survives.
#[wasm_bindgen]
pub fn sanitize_svg(raw: &str) -> String {
    sv_core::sanitize(raw)
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
}

fn now_ms() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("SVG viewer panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><rect id="r" width="40" height="40"/></svg>"#;

    #[test]
    fn load_reports_notification_json() {
        let mut viewer = SvgViewer::new(None);
        assert_eq!(
            viewer.load_file("image/png", SVG),
            r#"{"kind":"error","message":"Please upload an SVG file"}"#
        );
        assert_eq!(
            viewer.load_pasted(SVG),
            r#"{"kind":"success","message":"SVG rendered"}"#
        );
        assert_eq!(viewer.get_text(), SVG);
    }

    #[test]
    fn partial_config_json() {
        let mut viewer = SvgViewer::new(Some(r#"{"edit_mode": true}"#.to_string()));
        viewer.load_pasted(SVG);
        viewer.set_viewport(0.0, 0.0, 200.0, 200.0, 0.0, 0.0, 0.0, 0.0);
        viewer.handle_pointer_down(10.0, 10.0);
        assert_eq!(
            viewer.get_overlay_json(),
            r#"{"left":0.0,"top":0.0,"width":40.0,"height":40.0}"#
        );
        assert!(!viewer.handle_event_json(r#"{"type":"pointerDown","x":10,"y":10}"#));
        assert!(viewer.handle_event_json(r#"{"type":"pointerUp","x":15,"y":10}"#));
        assert!(!viewer.handle_event_json("not json"));
    }

    #[test]
    fn drag_reports_rewrite() {
        let mut viewer = SvgViewer::new(Some(r#"{"edit_mode": true}"#.to_string()));
        viewer.load_pasted(SVG);
        viewer.set_viewport(0.0, 0.0, 200.0, 200.0, 0.0, 0.0, 0.0, 0.0);
        viewer.handle_pointer_down(10.0, 10.0);
        assert!(!viewer.handle_pointer_down(10.0, 10.0));
        assert!(!viewer.handle_pointer_move(20.0, 10.0));
        assert!(viewer.handle_pointer_up(20.0, 10.0));
        assert!(viewer.get_text().contains("translate(10, 0)"));
        assert!(viewer.export_json().contains(r#""file_name":"image.svg""#));
    }

    #[test]
    fn nothing_loaded_outputs() {
        let viewer = SvgViewer::new(None);
        assert_eq!(viewer.get_overlay_json(), "null");
        assert_eq!(viewer.get_fields_json(), "null");
        assert_eq!(viewer.copy_json(), "null");
        assert_eq!(viewer.get_selectable_nodes_json(), "[]");
        assert_eq!(viewer.get_selected_id(), "");
    }
}
