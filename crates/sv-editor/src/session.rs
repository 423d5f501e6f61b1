//! Editing session: the single owner of the loaded document and every piece
//! of interactive state around it.
//!
//! The live tree and the canonical text are reconciled only at serialization
//! points: after a gesture ends, when a debounced field edit comes due, or on
//! an explicit `rewrite_now`. Between those the tree may run ahead of the
//! text.
//!
//! All work happens inside the caller's event callbacks; the session never
//! spawns or waits. Time enters only through `now_ms` arguments.

use crate::debounce::Debouncer;
use crate::gesture::{GestureController, GestureState};
use crate::input::InputEvent;
use crate::inspector::{Field, InspectorFields, apply_field, read_fields};
use crate::transform_store::TransformStore;
use kurbo::Point;
use serde::Serialize;
use sv_core::geometry::{parent_ctm, rendered_bbox, resolve_bounds};
use sv_core::model::is_graphics_element;
use sv_core::transform::Transform;
use sv_core::{
    EditorConfig, NodeId, NodeIndex, SerializeError, SvgDocument, parse_svg, sanitize,
    serialize_document,
};
use sv_render::{
    OverlayRect, Viewport, hit_test, overlay_for_bbox, recompute_overlay, resolve_selection,
};

/// File name offered for downloads.
pub const EXPORT_FILE_NAME: &str = "image.svg";

/// MIME type of exported markup.
pub const EXPORT_MIME: &str = "image/svg+xml;charset=utf-8";

// ─── Notifications ────────────────────────────────────────────────────────

/// Why a load was rejected. The document is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Please upload an SVG file")]
    WrongFileType { mime: String },
    #[error("Invalid SVG content")]
    InvalidMarkup,
    #[error("Paste SVG code first")]
    EmptyPaste,
}

/// A successful load, by entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSuccess {
    /// From a file (upload or drop).
    Loaded,
    /// From pasted text.
    Rendered,
}

impl LoadSuccess {
    pub fn message(self) -> &'static str {
        match self {
            LoadSuccess::Loaded => "SVG loaded",
            LoadSuccess::Rendered => "SVG rendered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A toast for the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn from_load(result: &Result<LoadSuccess, LoadError>) -> Self {
        match result {
            Ok(success) => Self {
                kind: NotificationKind::Success,
                message: success.message().to_string(),
            },
            Err(LoadError::EmptyPaste) => Self {
                kind: NotificationKind::Info,
                message: LoadError::EmptyPaste.to_string(),
            },
            Err(e) => Self {
                kind: NotificationKind::Error,
                message: e.to_string(),
            },
        }
    }

    pub fn copied() -> Self {
        Self {
            kind: NotificationKind::Success,
            message: "SVG code copied".to_string(),
        }
    }
}

/// Result of one serializer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeOutcome {
    /// New canonical text committed.
    Committed,
    /// Nothing loaded; nothing to do.
    Unchanged,
    /// The pass failed; the previous canonical text is kept.
    Failed,
}

/// Canonical markup packaged for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub contents: String,
}

/// A node the user can select, for tree views and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectableNode {
    pub id: NodeId,
    pub tag: String,
    /// Rendered box in viewport content coordinates.
    pub bounds: OverlayRect,
}

// ─── Session ──────────────────────────────────────────────────────────────

struct Document {
    tree: SvgDocument,
    canonical: String,
}

pub struct EditorSession {
    config: EditorConfig,
    document: Option<Document>,
    selection: Option<NodeIndex>,
    transforms: TransformStore,
    gesture: GestureController,
    debouncer: Debouncer,
    viewport: Viewport,
    overlay: Option<OverlayRect>,
    fields: Option<InspectorFields>,
    serialization_count: u64,
    last_serialize_error: Option<SerializeError>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce_ms),
            config,
            document: None,
            selection: None,
            transforms: TransformStore::new(),
            gesture: GestureController::new(),
            viewport: Viewport::default(),
            overlay: None,
            fields: None,
            serialization_count: 0,
            last_serialize_error: None,
        }
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Load the contents of an uploaded or dropped file.
    ///
    /// # Errors
    /// `WrongFileType` unless `mime` names an SVG type; `InvalidMarkup` when
    /// nothing loadable survives sanitization.
    pub fn load_file(&mut self, mime: &str, text: &str) -> Result<LoadSuccess, LoadError> {
        if !mime.contains("svg") {
            log::warn!("rejected upload of type {mime:?}");
            return Err(LoadError::WrongFileType {
                mime: mime.to_string(),
            });
        }
        self.load(text)?;
        Ok(LoadSuccess::Loaded)
    }

    /// Load pasted markup.
    ///
    /// # Errors
    /// `EmptyPaste` for empty input; `InvalidMarkup` when nothing loadable
    /// survives sanitization.
    pub fn load_from_pasted_text(&mut self, text: &str) -> Result<LoadSuccess, LoadError> {
        if text.is_empty() {
            return Err(LoadError::EmptyPaste);
        }
        self.load(text)?;
        Ok(LoadSuccess::Rendered)
    }

    fn load(&mut self, text: &str) -> Result<(), LoadError> {
        let cleaned = sanitize(text);
        if cleaned.is_empty() {
            log::warn!("rejected markup: no <svg> root after sanitizing");
            return Err(LoadError::InvalidMarkup);
        }
        let tree = parse_svg(&cleaned).map_err(|e| {
            log::warn!("rejected markup: {e}");
            LoadError::InvalidMarkup
        })?;
        // The text the shell shows is what the structural pass kept, not the
        // regex output.
        let canonical = serialize_document(&tree).map_err(|e| {
            log::warn!("rejected markup: {e}");
            LoadError::InvalidMarkup
        })?;

        self.reset_editing_state();
        log::info!(
            "loaded document: {} nodes, {} bytes",
            tree.graph.node_count(),
            canonical.len()
        );
        self.document = Some(Document { tree, canonical });
        Ok(())
    }

    /// Drop the document and everything derived from it.
    pub fn clear(&mut self) {
        self.reset_editing_state();
        self.document = None;
        log::info!("document cleared");
    }

    fn reset_editing_state(&mut self) {
        self.gesture.cancel();
        self.debouncer.cancel();
        self.transforms.clear();
        self.selection = None;
        self.overlay = None;
        self.fields = None;
        self.last_serialize_error = None;
    }

    // ─── Modes ───────────────────────────────────────────────────────────

    /// Turning edit mode off tears down any gesture and the selection.
    pub fn set_edit_mode(&mut self, on: bool) {
        self.config.edit_mode = on;
        if !on {
            self.deselect();
        }
    }

    /// Turning auto-rewrite off drops a pending debounced pass.
    pub fn set_auto_rewrite(&mut self, on: bool) {
        self.config.auto_rewrite = on;
        if !on {
            self.debouncer.cancel();
        }
    }

    pub fn edit_mode(&self) -> bool {
        self.config.edit_mode
    }

    pub fn auto_rewrite(&self) -> bool {
        self.config.auto_rewrite
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// The hosting viewport moved or resized.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.refresh_overlay();
    }

    /// The hosting viewport (or an ancestor) scrolled.
    pub fn scroll_to(&mut self, scroll_left: f64, scroll_top: f64) {
        self.viewport.scroll_left = scroll_left;
        self.viewport.scroll_top = scroll_top;
        self.refresh_overlay();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn refresh_overlay(&mut self) {
        self.overlay = self
            .document
            .as_ref()
            .and_then(|doc| recompute_overlay(&doc.tree, self.selection, &self.viewport));
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &InputEvent) {
        let (x, y) = event.position();
        match event {
            InputEvent::PointerDown { .. } => self.pointer_down(x, y),
            InputEvent::PointerMove { .. } => self.pointer_move(x, y),
            InputEvent::PointerUp { .. } => self.pointer_up(x, y),
        }
    }

    /// Pointer pressed at client position (x, y).
    ///
    /// On the current overlay this starts a move or resize; elsewhere inside
    /// the viewport it selects what is under the pointer, or deselects.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if !self.config.edit_mode || self.gesture.is_active() {
            return;
        }
        if self.document.is_none() {
            return;
        }
        if !self.viewport.contains(x, y) {
            log::trace!("pointer-down outside viewport ignored");
            return;
        }
        if self.begin_gesture(x, y) {
            return;
        }

        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let p = self.viewport.to_document(x, y);
        let bounds = resolve_bounds(&doc.tree);
        let target = hit_test(&doc.tree, &bounds, p.x, p.y)
            .and_then(|hit| resolve_selection(&doc.tree, hit));
        match target {
            Some(idx) => self.select_index(idx),
            None => self.deselect(),
        }
    }

    /// Start a move or resize if (x, y) is on the current overlay.
    fn begin_gesture(&mut self, x: f64, y: f64) -> bool {
        let (Some(doc), Some(selected), Some(overlay)) =
            (self.document.as_ref(), self.selection, self.overlay)
        else {
            return false;
        };
        let local = self.viewport.to_local(x, y);
        let Some(hit) = overlay.handle_at(local.x, local.y, self.config.handle_size) else {
            return false;
        };
        let Some(bbox) = rendered_bbox(&doc.tree, selected) else {
            return false;
        };
        let start = self.transforms.get(&doc.tree, selected);
        let parent = parent_ctm(&doc.tree, selected);
        self.gesture
            .begin(hit, selected, Point::new(x, y), start, bbox, parent)
    }

    /// Pointer moved to client position (x, y).
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some((idx, t)) = self
            .gesture
            .update(Point::new(x, y), self.config.min_scale_ratio)
        else {
            return;
        };
        let Some(doc) = self.document.as_mut().filter(|d| d.tree.contains(idx)) else {
            log::debug!("gesture target vanished; cancelling");
            self.gesture.cancel();
            return;
        };
        self.transforms.set(&mut doc.tree, idx, t);
        self.refresh_overlay();
    }

    /// Pointer released at client position (x, y). Ends any gesture and,
    /// with auto-rewrite on, serializes the result once.
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        if !self.gesture.is_active() {
            return;
        }
        self.pointer_move(x, y);
        if self.gesture.end().is_some() && self.config.auto_rewrite {
            self.rewrite_now();
        }
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node by id. Only graphics elements other than the root are
    /// selectable, and only in edit mode.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.config.edit_mode || self.gesture.is_active() {
            return false;
        }
        let Some(doc) = self.document.as_ref() else {
            return false;
        };
        let selectable = doc.tree.index_of(id).filter(|&idx| {
            idx != doc.tree.root
                && doc
                    .tree
                    .element(idx)
                    .is_some_and(|el| is_graphics_element(el.local_name()))
        });
        match selectable {
            Some(idx) => {
                self.select_index(idx);
                true
            }
            None => false,
        }
    }

    fn select_index(&mut self, idx: NodeIndex) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        if self.selection != Some(idx) {
            // Prime the store so later reads never depend on markup parsing.
            let t = self.transforms.get(&doc.tree, idx);
            self.transforms.set(&mut doc.tree, idx, t);
            log::debug!("selected {:?}", doc.tree.id_of(idx));
        }
        self.selection = Some(idx);
        self.fields = Some(read_fields(&doc.tree, idx));
        self.refresh_overlay();
    }

    /// Clear the selection. The node itself is untouched.
    pub fn deselect(&mut self) {
        self.gesture.cancel();
        self.selection = None;
        self.overlay = None;
        self.fields = None;
    }

    // ─── Field edits & serialization ─────────────────────────────────────

    /// Apply one inspector edit to the selection. With auto-rewrite on, a
    /// serializer pass is (re)scheduled one debounce window after `now_ms`.
    pub fn edit_field(&mut self, field: Field, value: &str, now_ms: u64) -> bool {
        let (Some(idx), Some(doc)) = (self.selection, self.document.as_mut()) else {
            return false;
        };
        if !apply_field(&mut doc.tree, idx, field, value) {
            return false;
        }
        // Mirror what was written (trimmed, with units), not what was typed.
        self.fields = Some(read_fields(&doc.tree, idx));
        self.refresh_overlay();
        if self.config.auto_rewrite {
            self.debouncer.schedule(now_ms);
        }
        true
    }

    /// Run the debounced serializer pass if it has come due.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.debouncer.poll(now_ms) {
            self.rewrite_now();
            return true;
        }
        false
    }

    /// Serialize the live tree into canonical text now, superseding any
    /// pending debounced pass. Failures keep the previous text.
    pub fn rewrite_now(&mut self) -> SerializeOutcome {
        self.debouncer.cancel();
        let Some(doc) = self.document.as_mut() else {
            return SerializeOutcome::Unchanged;
        };
        self.serialization_count += 1;
        match serialize_document(&doc.tree) {
            Ok(text) => {
                log::info!("canonical text rewritten ({} bytes)", text.len());
                doc.canonical = text;
                self.last_serialize_error = None;
                SerializeOutcome::Committed
            }
            Err(e) => {
                log::warn!("serialization failed, keeping last good text: {e}");
                self.last_serialize_error = Some(e);
                SerializeOutcome::Failed
            }
        }
    }

    pub fn has_pending_rewrite(&self) -> bool {
        self.debouncer.is_pending()
    }

    // ─── Outputs ─────────────────────────────────────────────────────────

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// The last serialized markup, or `""` with nothing loaded.
    pub fn canonical_text(&self) -> &str {
        self.document.as_ref().map_or("", |d| d.canonical.as_str())
    }

    /// The live tree.
    pub fn document(&self) -> Option<&SvgDocument> {
        self.document.as_ref().map(|d| &d.tree)
    }

    pub fn overlay(&self) -> Option<OverlayRect> {
        self.overlay
    }

    pub fn fields(&self) -> Option<&InspectorFields> {
        self.fields.as_ref()
    }

    pub fn selection(&self) -> Option<NodeIndex> {
        self.selection
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        let doc = self.document.as_ref()?;
        doc.tree.id_of(self.selection?)
    }

    pub fn transform_of(&self, id: NodeId) -> Option<Transform> {
        let doc = self.document.as_ref()?;
        let idx = doc.tree.index_of(id)?;
        Some(self.transforms.get(&doc.tree, idx))
    }

    pub fn serialization_count(&self) -> u64 {
        self.serialization_count
    }

    pub fn last_serialize_error(&self) -> Option<&SerializeError> {
        self.last_serialize_error.as_ref()
    }

    /// Canonical text for the clipboard, with its toast.
    pub fn copy_text(&self) -> Option<(&str, Notification)> {
        let text = self.canonical_text();
        (!text.is_empty()).then(|| (text, Notification::copied()))
    }

    /// Canonical text packaged as a download.
    pub fn export(&self) -> Option<ExportFile> {
        let text = self.canonical_text();
        (!text.is_empty()).then(|| ExportFile {
            file_name: EXPORT_FILE_NAME,
            mime: EXPORT_MIME,
            contents: text.to_string(),
        })
    }

    /// Every rendered, selectable node in document order.
    pub fn selectable_nodes(&self) -> Vec<SelectableNode> {
        let Some(doc) = self.document.as_ref() else {
            return Vec::new();
        };
        let bounds = resolve_bounds(&doc.tree);
        doc.tree
            .elements()
            .into_iter()
            .filter_map(|idx| {
                let bbox = bounds.get(&idx)?;
                let node = doc.tree.get(idx)?;
                Some(SelectableNode {
                    id: node.id,
                    tag: node.as_element()?.name.clone(),
                    bounds: overlay_for_bbox(*bbox, &self.viewport),
                })
            })
            .collect()
    }
}
