//! Property inspector binding: selected node ⇄ form fields.
//!
//! Fields are read from the node when the selection changes and written back
//! one at a time as the user edits them. Writes never flow the other way.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use sv_core::model::is_text_bearing;
use sv_core::style::computed_value;
use sv_core::{NodeIndex, SvgDocument};

/// Font stacks offered next to the font-family field. Not enforced.
pub const FONT_PRESETS: &[&str] = &[
    "Inter, system-ui, sans-serif",
    "Arial, Helvetica, sans-serif",
    "Georgia, 'Times New Roman', serif",
    "'Courier New', Courier, monospace",
    "ui-monospace, SFMono-Regular, Menlo, monospace",
    "'Trebuchet MS', sans-serif",
    "Verdana, Geneva, sans-serif",
];

/// An editable inspector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Text,
    Fill,
    Stroke,
    FontSize,
    FontFamily,
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Field::Text),
            "fill" => Ok(Field::Fill),
            "stroke" => Ok(Field::Stroke),
            "fontSize" | "font-size" => Ok(Field::FontSize),
            "fontFamily" | "font-family" => Ok(Field::FontFamily),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

impl Field {
    fn attr_name(self) -> Option<&'static str> {
        match self {
            Field::Text => None,
            Field::Fill => Some("fill"),
            Field::Stroke => Some("stroke"),
            Field::FontSize => Some("font-size"),
            Field::FontFamily => Some("font-family"),
        }
    }
}

/// Current values for the inspector form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorFields {
    pub text: String,
    pub fill: String,
    pub stroke: String,
    pub font_size: String,
    pub font_family: String,
    /// Whether the text and font fields apply to this node.
    pub is_text: bool,
}

/// Read the inspector fields for the element at `idx`.
pub fn read_fields(doc: &SvgDocument, idx: NodeIndex) -> InspectorFields {
    let Some(el) = doc.element(idx) else {
        return InspectorFields::default();
    };
    let specified = |name: &str| {
        el.attr(name)
            .map(str::to_string)
            .or_else(|| computed_value(doc, idx, name))
            .unwrap_or_default()
    };
    let paint = |name: &str| {
        let value = specified(name);
        if value == "none" { String::new() } else { value }
    };

    let mut fields = InspectorFields {
        fill: paint("fill"),
        stroke: paint("stroke"),
        ..InspectorFields::default()
    };
    if is_text_bearing(el.local_name()) {
        fields.is_text = true;
        fields.text = doc.text_content(idx);
        fields.font_size = strip_unit(&specified("font-size")).to_string();
        fields.font_family = specified("font-family");
    }
    fields
}

/// `16px` → `16`, `1.5em` → `1.5`.
fn strip_unit(value: &str) -> &str {
    value
        .trim()
        .trim_end_matches(|c: char| !(c.is_ascii_digit() || c == '.'))
}

/// Write one field to the element at `idx`.
///
/// Returns `false` when nothing was written: a missing node, or a text edit
/// on an element that carries no text.
pub fn apply_field(doc: &mut SvgDocument, idx: NodeIndex, field: Field, value: &str) -> bool {
    let Some(el) = doc.element(idx) else {
        return false;
    };
    if field == Field::Text {
        if !is_text_bearing(el.local_name()) {
            log::debug!("text edit ignored on <{}>", el.name);
            return false;
        }
        doc.set_text_content(idx, value);
        return true;
    }

    let Some(name) = field.attr_name() else {
        return false;
    };
    let Some(el) = doc.element_mut(idx) else {
        return false;
    };
    let value = value.trim();
    if value.is_empty() {
        el.remove_attr(name);
    } else if field == Field::FontSize && value.ends_with(|c: char| c.is_ascii_digit()) {
        el.set_attr(name, format!("{value}px"));
    } else {
        el.set_attr(name, value);
    }
    log::trace!("{name} = {value:?}");
    true
}
