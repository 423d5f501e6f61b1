//! Textual sanitizer for untrusted SVG markup.
//!
//! Removes embedded `<script>` blocks, `on*` event-handler attributes, and
//! `href`/`xlink:href` attributes that point at a script-executing URI, then
//! checks that an `<svg> … </svg>` root pair is still present.
//!
//! This is a best-effort textual filter, not a parser-based defusal. The
//! arena builder in `parser.rs` applies the same rules structurally.

use regex::Regex;
use std::sync::OnceLock;

fn self_closing_script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<script\b[^>]*/\s*>").expect("valid regex"))
}

fn script_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"))
}

fn event_handler_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
    })
}

/// A handler glued to the previous attribute's closing quote (`a="1"onclick="x"`)
/// or to a `/`, which HTML parsers also treat as an attribute separator.
fn glued_event_handler_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)([/"'])on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
    })
}

fn script_uri_href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\s+(?:xlink:)?href\s*=\s*(?:"\s*(?:java|vb)script:[^"]*"|'\s*(?:java|vb)script:[^']*')"#,
        )
        .expect("valid regex")
    })
}

fn glued_script_uri_href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)([/"'])(?:xlink:)?href\s*=\s*(?:"\s*(?:java|vb)script:[^"]*"|'\s*(?:java|vb)script:[^']*')"#,
        )
        .expect("valid regex")
    })
}

fn svg_root_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<svg[\s>].*</svg\s*>").expect("valid regex"))
}

/// Sanitize raw markup. Returns an empty string when no SVG root survives.
///
/// Removal passes repeat until nothing changes, so a construct revealed by
/// removing another (`<scr<script></script>ipt>`) is caught too and
/// `sanitize(sanitize(s)) == sanitize(s)` holds for every input.
pub fn sanitize(raw: &str) -> String {
    let mut svg = raw.to_string();
    loop {
        let next = strip_once(&svg);
        if next == svg {
            break;
        }
        svg = next;
    }

    if !has_svg_root(&svg) {
        log::debug!("sanitize: no <svg> root pair after stripping");
        return String::new();
    }
    svg.trim().to_string()
}

fn strip_once(input: &str) -> String {
    let out = self_closing_script_regex().replace_all(input, "");
    let out = script_block_regex().replace_all(&out, "");
    let out = glued_event_handler_regex().replace_all(&out, "${1}");
    let out = event_handler_regex().replace_all(&out, "");
    let out = glued_script_uri_href_regex().replace_all(&out, "${1}");
    let out = script_uri_href_regex().replace_all(&out, "");
    out.into_owned()
}

/// Whether `text` contains an opening/closing `<svg>` pair.
pub fn has_svg_root(text: &str) -> bool {
    svg_root_regex().is_match(text)
}

/// Whether an attribute value names a script-executing URI scheme.
///
/// Whitespace and control characters are ignored, as browsers do when
/// resolving the scheme (`java\tscript:`).
pub fn is_script_uri(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:")
}

/// Whether an attribute name is an inline event handler (`onclick`, `onLoad`).
pub fn is_event_handler(name: &str) -> bool {
    let local = crate::model::local_part(name);
    match (local.get(..2), local.get(2..)) {
        (Some(prefix), Some(rest)) => {
            prefix.eq_ignore_ascii_case("on")
                && !rest.is_empty()
                && rest.chars().all(|c| c.is_ascii_alphabetic())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_script_block_keeps_shapes() {
        let out = sanitize(r#"<svg><script>alert(1)</script><rect width="10" height="10"/></svg>"#);
        assert_eq!(out, r#"<svg><rect width="10" height="10"/></svg>"#);
    }

    #[test]
    fn strips_multiline_and_uppercase_scripts() {
        let out = sanitize("<svg>\n<SCRIPT type=\"text/javascript\">\nlet a = 1;\n</SCRIPT>\n</svg>");
        assert!(!out.to_lowercase().contains("script"));
        assert!(out.starts_with("<svg>"));
    }

    #[test]
    fn strips_self_closing_script() {
        let out = sanitize(r#"<svg><script href="evil.js"/><circle r="2"/></svg>"#);
        assert_eq!(out, r#"<svg><circle r="2"/></svg>"#);
    }

    #[test]
    fn strips_nested_reassembled_script() {
        let out = sanitize("<svg><scr<script></script>ipt>alert(1)</script></svg>");
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert"));
    }

    #[test]
    fn strips_event_handlers_in_both_quote_styles() {
        let out = sanitize(
            r#"<svg onload="boom()"><rect onclick='x()' onMouseOver = "y()" width="1"/></svg>"#,
        );
        assert_eq!(out, r#"<svg><rect width="1"/></svg>"#);
    }

    #[test]
    fn strips_handlers_after_slash_separator() {
        let out = sanitize(
            r#"<svg><image href="x.png"/onerror="alert(1)"/><g/onclick="alert(2)"></g></svg>"#,
        );
        assert_eq!(out, r#"<svg><image href="x.png"//><g/></g></svg>"#);
    }

    #[test]
    fn keeps_attributes_that_merely_contain_on() {
        let input = r#"<svg version="1.1"><text font-family="Mono" data-onion="1" stroke-linejoin="round">x</text></svg>"#;
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn strips_script_uri_hrefs() {
        let out = sanitize(
            r#"<svg><a href="javascript:alert(1)"><use xlink:href=' JavaScript:void(0)'/></a><a href="https://example.com"/></svg>"#,
        );
        assert_eq!(
            out,
            r#"<svg><a><use/></a><a href="https://example.com"/></svg>"#
        );
    }

    #[test]
    fn strips_vbscript_hrefs() {
        let out = sanitize(r#"<svg><a href="vbscript:msgbox(1)">x</a></svg>"#);
        assert_eq!(out, "<svg><a>x</a></svg>");
    }

    #[test]
    fn rejects_markup_without_svg_root() {
        assert_eq!(sanitize("<div>not svg</div>"), "");
        assert_eq!(sanitize("<svg"), "");
        assert_eq!(sanitize("<svg/>"), "");
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("<svgfoo></svgfoo>"), "");
    }

    #[test]
    fn accepts_prolog_and_trims() {
        let out = sanitize("  <?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>\n ");
        assert!(out.starts_with("<?xml"));
        assert!(out.ends_with("</svg>"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            r#"<svg><script>alert(1)</script><rect width="10" height="10"/></svg>"#,
            r#"<svg><rect onclick="a()"onload="b()" width="1"/></svg>"#,
            "<svg><scr<script></script>ipt>alert(1)</script></svg>",
            r#"<svg><a href="javascript:x" xlink:href='javascript:y'>t</a></svg>"#,
            "<div>not svg</div>",
            "   <svg>\n</svg>   ",
            r#"<svg><rect  onclick="1"  onmouseover="2"/></svg>"#,
            r#"<svg><image href="x.png"/onerror="a()"/onload="b()"/></svg>"#,
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn unsafe_constructs_never_survive() {
        let inputs = [
            r#"<svg><script>alert(1)</script></svg>"#,
            r#"<svg><g onclick="x()"/></svg>"#,
            r#"<svg><a xlink:href="javascript:alert(1)"/></svg>"#,
            "<svg><scr<script></script>ipt>alert(1)</script></svg>",
            r#"<svg><image href="x.png"/onerror="alert(1)"/><g/onclick="alert(2)"></g></svg>"#,
            r#"<svg><a/href="javascript:alert(1)"/><use x="1"/xlink:href='javascript:y'/></svg>"#,
        ];
        for input in inputs {
            let out = sanitize(input).to_lowercase();
            assert!(!out.contains("<script"), "{out}");
            assert!(!out.contains("onclick"), "{out}");
            assert!(!out.contains("onerror"), "{out}");
            assert!(!out.contains("javascript:"), "{out}");
        }
    }

    #[test]
    fn script_uri_detection() {
        assert!(is_script_uri("javascript:alert(1)"));
        assert!(is_script_uri("  JaVa\tScRiPt:alert(1)"));
        assert!(is_script_uri("vbscript:x"));
        assert!(!is_script_uri("#shape"));
        assert!(!is_script_uri("https://example.com/javascript:"));
    }

    #[test]
    fn event_handler_detection() {
        assert!(is_event_handler("onclick"));
        assert!(is_event_handler("onLoad"));
        assert!(!is_event_handler("on"));
        assert!(!is_event_handler("opacity"));
        assert!(!is_event_handler("one-thing"));
    }
}
