//! Interactive editing on top of `sv-core`: selection, move/resize gestures,
//! the per-node transform store, the property inspector, and the debounced
//! serializer that keeps the canonical text in step with the live tree.

pub mod debounce;
pub mod gesture;
pub mod input;
pub mod inspector;
pub mod session;
pub mod transform_store;

pub use debounce::Debouncer;
pub use gesture::{GestureController, GestureState};
pub use input::InputEvent;
pub use inspector::{FONT_PRESETS, Field, InspectorFields};
pub use session::{
    EXPORT_FILE_NAME, EXPORT_MIME, EditorSession, ExportFile, LoadError, LoadSuccess,
    Notification, NotificationKind, SelectableNode, SerializeOutcome,
};
pub use transform_store::TransformStore;
