//! `svgv`: sanitize, inspect, and script edits on SVG files from the shell.
//!
//! Edits run through the same session as the browser: moves and resizes are
//! replayed as pointer gestures on the selection overlay, so the output is
//! byte-for-byte what an interactive edit would produce.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use sv_core::EditorConfig;
use sv_editor::{EditorSession, Field, LoadSuccess};
use sv_render::Viewport;

/// Margin between the client origin and the document, so shapes at negative
/// coordinates still sit inside the synthetic viewport.
const CANVAS_MARGIN: f64 = 1.0e6;

#[derive(Parser, Debug)]
#[command(name = "svgv", about = "SVG sanitizer, inspector and scripted editor", version)]
struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strip scripts and event handlers; print the cleaned markup.
    Sanitize {
        /// Input file, or `-` for stdin.
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every rendered, selectable node as JSON.
    Nodes {
        input: PathBuf,
    },
    /// Print the inspector fields of one node as JSON.
    Inspect {
        input: PathBuf,
        /// Value of the node's `id` attribute.
        #[arg(long)]
        select: String,
    },
    /// Edit one node and print the re-serialized markup.
    Edit(EditArgs),
}

#[derive(Args, Debug, Default)]
struct EditArgs {
    input: PathBuf,
    /// Value of the node's `id` attribute.
    #[arg(long)]
    select: String,
    /// Translate by `DX,DY` document pixels.
    #[arg(long = "move", value_parser = parse_pair, allow_hyphen_values = true)]
    move_by: Option<(f64, f64)>,
    /// Multiply the current scale by `KX,KY`.
    #[arg(long, value_parser = parse_pair)]
    scale: Option<(f64, f64)>,
    #[arg(long)]
    fill: Option<String>,
    #[arg(long)]
    stroke: Option<String>,
    #[arg(long)]
    font_size: Option<String>,
    #[arg(long)]
    font_family: Option<String>,
    /// Replace the text content (text elements only).
    #[arg(long)]
    text: Option<String>,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sanitize { input, output } => {
            let raw = read_input(&input)?;
            let clean = sv_core::sanitize(&raw);
            if clean.is_empty() {
                bail!("{}: no <svg> root after sanitizing", input.display());
            }
            write_output(output.as_deref(), &clean)
        }
        Command::Nodes { input } => {
            let session = load(&input, EditorConfig::default())?;
            let json = serde_json::to_string_pretty(&session.selectable_nodes())?;
            write_output(None, &json)
        }
        Command::Inspect { input, select } => {
            let mut session = load(&input, editing_config())?;
            select_by_attr(&mut session, &select)?;
            let json = serde_json::to_string_pretty(&session.fields())?;
            write_output(None, &json)
        }
        Command::Edit(args) => {
            let mut session = load(&args.input, editing_config())?;
            apply_edits(&mut session, &args)?;
            write_output(args.output.as_deref(), session.canonical_text())
        }
    }
}

fn editing_config() -> EditorConfig {
    EditorConfig {
        edit_mode: true,
        auto_rewrite: false,
        handle_size: 0.0,
        ..EditorConfig::default()
    }
}

// ─── Input / output ───────────────────────────────────────────────────────

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
            Ok(())
        }
    }
}

/// Files go through the upload path (type checked by extension); stdin goes
/// through the paste path.
fn load(path: &Path, config: EditorConfig) -> Result<EditorSession> {
    let text = read_input(path)?;
    let mut session = EditorSession::new(config);
    session.set_viewport(Viewport {
        width: 2.0 * CANVAS_MARGIN,
        height: 2.0 * CANVAS_MARGIN,
        content_x: CANVAS_MARGIN,
        content_y: CANVAS_MARGIN,
        ..Viewport::default()
    });
    let result = if path.as_os_str() == "-" {
        session.load_from_pasted_text(&text)
    } else {
        session.load_file(mime_for(path), &text)
    };
    let success: LoadSuccess = result.map_err(|e| anyhow!("{}: {e}", path.display()))?;
    log::info!("{}", success.message());
    Ok(session)
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ─── Editing ──────────────────────────────────────────────────────────────

fn select_by_attr(session: &mut EditorSession, id_attr: &str) -> Result<()> {
    let id = session
        .document()
        .and_then(|doc| doc.id_of(doc.find_by_id_attr(id_attr)?))
        .ok_or_else(|| anyhow!("no element with id {id_attr:?}"))?;
    if !session.select(id) {
        bail!("element {id_attr:?} is not a selectable shape");
    }
    Ok(())
}

fn apply_edits(session: &mut EditorSession, args: &EditArgs) -> Result<()> {
    select_by_attr(session, &args.select)?;

    let fields = [
        (Field::Fill, &args.fill),
        (Field::Stroke, &args.stroke),
        (Field::FontSize, &args.font_size),
        (Field::FontFamily, &args.font_family),
        (Field::Text, &args.text),
    ];
    for (field, value) in fields {
        let Some(value) = value else { continue };
        if !session.edit_field(field, value, 0) {
            bail!("cannot set {field:?} on {:?}", args.select);
        }
    }

    if let Some((dx, dy)) = args.move_by {
        let (x, y) = overlay_point(session, 0.5, 0.5)?;
        drag(session, (x, y), (x + dx, y + dy));
    }
    if let Some((kx, ky)) = args.scale {
        if kx <= 0.0 || ky <= 0.0 {
            bail!("scale factors must be positive");
        }
        let overlay = session
            .overlay()
            .ok_or_else(|| anyhow!("{:?} has no rendered box", args.select))?;
        let (x, y) = overlay_point(session, 1.0, 1.0)?;
        let to = (
            x + overlay.width * (kx - 1.0),
            y + overlay.height * (ky - 1.0),
        );
        drag(session, (x, y), to);
    }

    session.rewrite_now();
    if let Some(e) = session.last_serialize_error() {
        bail!("serialization failed: {e}");
    }
    Ok(())
}

/// Client point at fractional position (`fx`, `fy`) of the overlay.
fn overlay_point(session: &EditorSession, fx: f64, fy: f64) -> Result<(f64, f64)> {
    let overlay = session
        .overlay()
        .ok_or_else(|| anyhow!("selection has no rendered box"))?;
    let vp = session.viewport();
    Ok((
        vp.left - vp.scroll_left + overlay.left + overlay.width * fx,
        vp.top - vp.scroll_top + overlay.top + overlay.height * fy,
    ))
}

fn drag(session: &mut EditorSession, from: (f64, f64), to: (f64, f64)) {
    session.pointer_down(from.0, from.1);
    session.pointer_move(to.0, to.1);
    session.pointer_up(to.0, to.1);
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `X,Y`, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("{v:?}: {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100"><rect id="box" x="-20" y="10" width="40" height="20"/><text id="t" x="0" y="50">hi</text></svg>"#;

    fn session() -> EditorSession {
        let mut s = EditorSession::new(editing_config());
        s.set_viewport(Viewport {
            width: 2.0 * CANVAS_MARGIN,
            height: 2.0 * CANVAS_MARGIN,
            content_x: CANVAS_MARGIN,
            content_y: CANVAS_MARGIN,
            ..Viewport::default()
        });
        s.load_from_pasted_text(DOC).unwrap();
        s
    }

    fn args(select: &str) -> EditArgs {
        EditArgs {
            select: select.to_string(),
            ..EditArgs::default()
        }
    }

    #[test]
    fn pairs_parse() {
        assert_eq!(parse_pair("50,-20"), Ok((50.0, -20.0)));
        assert_eq!(parse_pair(" 1.5 , 2 "), Ok((1.5, 2.0)));
        assert!(parse_pair("50").is_err());
        assert!(parse_pair("a,b").is_err());
    }

    #[test]
    fn move_replays_a_drag() {
        let mut s = session();
        apply_edits(
            &mut s,
            &EditArgs {
                move_by: Some((50.0, -20.0)),
                ..args("box")
            },
        )
        .unwrap();
        assert!(
            s.canonical_text()
                .contains(r#"transform="translate(50, -20) scale(1, 1)""#)
        );
    }

    #[test]
    fn scale_replays_a_corner_resize() {
        let mut s = session();
        apply_edits(
            &mut s,
            &EditArgs {
                scale: Some((2.0, 0.5)),
                ..args("box")
            },
        )
        .unwrap();
        assert!(s.canonical_text().contains("scale(2, 0.5)"));
    }

    #[test]
    fn field_edits_and_errors() {
        let mut s = session();
        apply_edits(
            &mut s,
            &EditArgs {
                font_size: Some("12".into()),
                text: Some("bye".into()),
                ..args("t")
            },
        )
        .unwrap();
        assert!(s.canonical_text().contains(r#"font-size="12px""#));
        assert!(s.canonical_text().contains(">bye</text>"));

        let err = apply_edits(
            &mut session(),
            &EditArgs {
                text: Some("nope".into()),
                ..args("box")
            },
        );
        assert!(err.is_err());
        assert!(apply_edits(&mut session(), &args("missing")).is_err());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("a/b.SVG")), "image/svg+xml");
        assert_eq!(mime_for(Path::new("a/b.png")), "application/octet-stream");
    }
}
