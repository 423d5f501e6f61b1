//! The editor's per-node override transform and SVG `transform` list parsing.
//!
//! A `Transform` is the translate + non-uniform scale tuple the editor writes
//! as a single `translate(tx, ty) scale(sx, sy)` attribute, replacing whatever
//! the markup carried. Existing markup is read two ways: `parse_transform_attr`
//! seeds the tuple from `translate`/`scale` functions only, while
//! `parse_affine` evaluates the whole list for geometry.

use crate::model::Element;
use kurbo::Affine;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use winnow::combinator::delimited;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

/// Private attributes that earlier exports used to carry transform state.
/// Read when seeding a node's transform, stripped on every serialization.
pub const BOOKKEEPING_ATTRS: [&str; 4] = ["data-sv-tx", "data-sv-ty", "data-sv-sx", "data-sv-sy"];

/// Translate + non-uniform scale, applied as `translate(tx, ty) scale(sx, sy)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub tx: f64,
    pub ty: f64,
    pub sx: f64,
    pub sy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        tx: 0.0,
        ty: 0.0,
        sx: 1.0,
        sy: 1.0,
    };

    pub const fn new(tx: f64, ty: f64, sx: f64, sy: f64) -> Self {
        Self { tx, ty, sx, sy }
    }

    /// Render as a `transform` attribute value.
    pub fn to_attr(&self) -> String {
        format!(
            "translate({}, {}) scale({}, {})",
            format_number(self.tx),
            format_number(self.ty),
            format_number(self.sx),
            format_number(self.sy)
        )
    }

    pub fn to_affine(&self) -> Affine {
        Affine::translate((self.tx, self.ty)) * Affine::scale_non_uniform(self.sx, self.sy)
    }

    /// Read bookkeeping attributes, if the element carries any.
    pub fn from_bookkeeping(el: &Element) -> Option<Self> {
        if !BOOKKEEPING_ATTRS.iter().any(|name| el.has_attr(name)) {
            return None;
        }
        let read = |name: &str, fallback: f64| parse_component(el.attr(name), fallback);
        Some(Self {
            tx: read(BOOKKEEPING_ATTRS[0], 0.0),
            ty: read(BOOKKEEPING_ATTRS[1], 0.0),
            sx: read(BOOKKEEPING_ATTRS[2], 1.0),
            sy: read(BOOKKEEPING_ATTRS[3], 1.0),
        })
    }
}

/// Shortest readable form: integral values drop the fraction, noise beyond
/// six decimals is rounded away, and `-0` prints as `0`.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let rounded = (v * 1e6).round() / 1e6;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Parse one numeric component, falling back for missing, malformed, or
/// non-finite input. Accepts signs and exponents (`-1.5e2`, `+3`).
pub fn parse_component(raw: Option<&str>, fallback: f64) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

// ─── Transform list tokenizer ────────────────────────────────────────────

/// One function of a transform list, e.g. `scale(2 3)` → `("scale", ["2", "3"])`.
#[derive(Debug, Clone, PartialEq)]
struct TransformFn<'a> {
    name: &'a str,
    args: SmallVec<[&'a str; 6]>,
}

impl TransformFn<'_> {
    fn arg(&self, i: usize, fallback: f64) -> f64 {
        parse_component(self.args.get(i).copied(), fallback)
    }
}

fn skip_separators(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> =
        take_while(0.., |c: char| c.is_whitespace() || c == ',').parse_next(input);
}

fn function_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

fn argument_list<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited('(', take_till(0.., ')'), ')').parse_next(input)
}

fn transform_fn<'a>(input: &mut &'a str) -> ModalResult<TransformFn<'a>> {
    let name = function_name(input)?;
    skip_separators(input);
    let body = argument_list(input)?;
    let args = body
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();
    Ok(TransformFn { name, args })
}

/// Tokenize a transform list, stopping at the first malformed function.
fn transform_list(input: &str) -> Vec<TransformFn<'_>> {
    let mut rest = input;
    let mut out = Vec::new();
    loop {
        skip_separators(&mut rest);
        if rest.is_empty() {
            break;
        }
        match transform_fn(&mut rest) {
            Ok(f) => out.push(f),
            Err(_) => {
                log::trace!("transform list: stopping at {rest:?}");
                break;
            }
        }
    }
    out
}

/// Seed a `Transform` from an existing `transform` attribute.
///
/// Only `translate` and `scale` contribute; anything else is ignored and
/// every malformed component keeps its identity value.
pub fn parse_transform_attr(value: &str) -> Transform {
    let mut t = Transform::IDENTITY;
    for f in transform_list(value) {
        match f.name {
            "translate" => {
                t.tx = f.arg(0, 0.0);
                t.ty = f.arg(1, 0.0);
            }
            "scale" => {
                t.sx = f.arg(0, 1.0);
                t.sy = if f.args.len() > 1 { f.arg(1, 1.0) } else { t.sx };
            }
            _ => {}
        }
    }
    t
}

/// Evaluate a full transform list (`matrix`, `translate`, `scale`, `rotate`,
/// `skewX`, `skewY`). Unknown functions contribute identity.
pub fn parse_affine(value: &str) -> Affine {
    transform_list(value)
        .iter()
        .fold(Affine::IDENTITY, |acc, f| acc * function_affine(f))
}

fn function_affine(f: &TransformFn<'_>) -> Affine {
    match f.name {
        "matrix" if f.args.len() == 6 => Affine::new([
            f.arg(0, 1.0),
            f.arg(1, 0.0),
            f.arg(2, 0.0),
            f.arg(3, 1.0),
            f.arg(4, 0.0),
            f.arg(5, 0.0),
        ]),
        "translate" => Affine::translate((f.arg(0, 0.0), f.arg(1, 0.0))),
        "scale" => {
            let sx = f.arg(0, 1.0);
            let sy = if f.args.len() > 1 { f.arg(1, 1.0) } else { sx };
            Affine::scale_non_uniform(sx, sy)
        }
        "rotate" => {
            let angle = f.arg(0, 0.0).to_radians();
            let (cx, cy) = (f.arg(1, 0.0), f.arg(2, 0.0));
            Affine::translate((cx, cy)) * Affine::rotate(angle) * Affine::translate((-cx, -cy))
        }
        "skewX" => Affine::new([1.0, 0.0, f.arg(0, 0.0).to_radians().tan(), 1.0, 0.0, 0.0]),
        "skewY" => Affine::new([1.0, f.arg(0, 0.0).to_radians().tan(), 0.0, 1.0, 0.0, 0.0]),
        _ => Affine::IDENTITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use pretty_assertions::assert_eq;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn attr_format() {
        assert_eq!(
            Transform::new(50.0, -20.0, 1.0, 1.0).to_attr(),
            "translate(50, -20) scale(1, 1)"
        );
        assert_eq!(
            Transform::new(0.5, -0.0, 1.25, 0.05).to_attr(),
            "translate(0.5, 0) scale(1.25, 0.05)"
        );
        assert_eq!(
            Transform::new(0.1 + 0.2, 0.0, 1.0, 1.0).to_attr(),
            "translate(0.3, 0) scale(1, 1)"
        );
    }

    #[test]
    fn seed_from_translate_and_scale() {
        assert_eq!(
            parse_transform_attr("translate(10, 20) scale(2, 3)"),
            Transform::new(10.0, 20.0, 2.0, 3.0)
        );
        assert_eq!(
            parse_transform_attr("translate(10) scale(2)"),
            Transform::new(10.0, 0.0, 2.0, 2.0)
        );
        assert_eq!(
            parse_transform_attr("  translate( -1.5e1 , +4 )"),
            Transform::new(-15.0, 4.0, 1.0, 1.0)
        );
    }

    #[test]
    fn seed_ignores_other_functions() {
        assert_eq!(
            parse_transform_attr("rotate(45) translate(3 4)"),
            Transform::new(3.0, 4.0, 1.0, 1.0)
        );
    }

    #[test]
    fn malformed_components_fall_back_to_identity() {
        assert_eq!(
            parse_transform_attr("translate(abc, 7) scale(NaN, x)"),
            Transform::new(0.0, 7.0, 1.0, 1.0)
        );
        assert_eq!(parse_transform_attr("garbage"), Transform::IDENTITY);
        assert_eq!(parse_transform_attr(""), Transform::IDENTITY);
        assert_eq!(parse_transform_attr("translate(1, 2"), Transform::IDENTITY);
    }

    #[test]
    fn written_attr_parses_back() {
        let t = Transform::new(12.5, -3.0, 0.75, 2.0);
        assert_eq!(parse_transform_attr(&t.to_attr()), t);
    }

    #[test]
    fn affine_matches_tuple() {
        let t = Transform::new(5.0, 6.0, 2.0, 3.0);
        let p = Point::new(1.0, 1.0);
        assert!(close(parse_affine(&t.to_attr()) * p, t.to_affine() * p));
        assert!(close(t.to_affine() * p, Point::new(7.0, 9.0)));
    }

    #[test]
    fn affine_full_list() {
        let m = parse_affine("matrix(1 0 0 1 10 20)");
        assert!(close(m * Point::ORIGIN, Point::new(10.0, 20.0)));

        let r = parse_affine("rotate(90 10 10)");
        assert!(close(r * Point::new(20.0, 10.0), Point::new(10.0, 20.0)));

        let composed = parse_affine("translate(10,0) scale(2)");
        assert!(close(composed * Point::new(1.0, 1.0), Point::new(12.0, 2.0)));

        let skew = parse_affine("skewX(45)");
        assert!(close(skew * Point::new(0.0, 1.0), Point::new(1.0, 1.0)));
    }

    #[test]
    fn bookkeeping_attrs_seed_transform() {
        let el = Element::new("rect")
            .with_attr("data-sv-tx", "4")
            .with_attr("data-sv-sx", "oops");
        assert_eq!(
            Transform::from_bookkeeping(&el),
            Some(Transform::new(4.0, 0.0, 1.0, 1.0))
        );
        assert_eq!(Transform::from_bookkeeping(&Element::new("rect")), None);
    }
}
