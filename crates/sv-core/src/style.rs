//! Presentation-attribute and inline-style lookup.
//!
//! A property's specified value comes from the element's `style` attribute
//! first, then from the presentation attribute of the same name. Computed
//! values walk up the tree for inherited properties and fall back to the
//! property's initial value.

use crate::model::{Element, SvgDocument};
use petgraph::graph::NodeIndex;

/// Properties the inspector reads, with their initial values.
const INITIAL_VALUES: &[(&str, &str)] = &[
    ("fill", "black"),
    ("stroke", "none"),
    ("font-size", "16px"),
    ("font-family", "serif"),
    ("text-anchor", "start"),
    ("display", "inline"),
];

/// Whether a property inherits from the parent element.
pub fn is_inherited(prop: &str) -> bool {
    matches!(
        prop,
        "fill" | "stroke" | "font-size" | "font-family" | "text-anchor" | "visibility"
    )
}

/// Initial value of a property, if known.
pub fn initial_value(prop: &str) -> Option<&'static str> {
    INITIAL_VALUES
        .iter()
        .find(|(name, _)| *name == prop)
        .map(|(_, value)| *value)
}

/// Look up a declaration in an inline `style` attribute. The last declaration
/// wins; `!important` is dropped.
pub fn style_declaration<'a>(style: &'a str, prop: &str) -> Option<&'a str> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(prop))
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_suffix("!important")
                .map_or(value, str::trim_end)
        })
        .filter(|value| !value.is_empty())
        .last()
}

/// The value specified on the element itself, ignoring inheritance.
pub fn presentation_value<'a>(el: &'a Element, prop: &str) -> Option<&'a str> {
    el.attr("style")
        .and_then(|style| style_declaration(style, prop))
        .or_else(|| el.attr(prop).map(str::trim).filter(|v| !v.is_empty()))
}

/// The computed value of `prop` for the element at `idx`.
pub fn computed_value(doc: &SvgDocument, idx: NodeIndex, prop: &str) -> Option<String> {
    let mut chain = std::iter::once(idx).chain(doc.ancestors(idx));
    let found = if is_inherited(prop) {
        chain.find_map(|i| {
            doc.element(i)
                .and_then(|el| presentation_value(el, prop))
                .filter(|v| *v != "inherit")
        })
    } else {
        chain
            .next()
            .and_then(|i| doc.element(i))
            .and_then(|el| presentation_value(el, prop))
    };
    found.or_else(|| initial_value(prop)).map(str::to_string)
}
