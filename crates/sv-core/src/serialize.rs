//! Live tree → canonical markup text.
//!
//! The pipeline works on a clone, so the interactive tree is never touched:
//! strip bookkeeping attributes at every depth, make sure the root declares
//! the SVG namespace, emit, then run the result back through the sanitizer.

use crate::emitter::emit_document;
use crate::model::{Attribute, SVG_NAMESPACE, SvgDocument};
use crate::sanitize::sanitize;
use crate::transform::BOOKKEEPING_ATTRS;

/// Why a serialization pass produced nothing to commit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("document has no root element")]
    MissingRoot,
    #[error("serialized markup was rejected by the sanitizer")]
    Rejected,
}

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Serialize a document into clean, sanitized markup.
///
/// # Errors
/// Returns an error when the emitted markup does not survive sanitization;
/// callers keep their previous canonical text in that case.
pub fn serialize_document(doc: &SvgDocument) -> Result<String, SerializeError> {
    let mut clone = doc.clone();
    strip_bookkeeping(&mut clone);

    let root = clone.root_element_mut().ok_or(SerializeError::MissingRoot)?;
    if !root.has_attr("xmlns") {
        root.attrs.insert(
            0,
            Attribute {
                name: "xmlns".to_string(),
                value: SVG_NAMESPACE.to_string(),
            },
        );
    }

    let text = sanitize(&emit_document(&clone));
    if text.is_empty() {
        return Err(SerializeError::Rejected);
    }
    Ok(text)
}

/// Remove every bookkeeping attribute from every element.
pub fn strip_bookkeeping(doc: &mut SvgDocument) {
    for idx in doc.elements() {
        if let Some(el) = doc.element_mut(idx) {
            el.attrs
                .retain(|a| !BOOKKEEPING_ATTRS.contains(&a.name.as_str()));
        }
    }
}
