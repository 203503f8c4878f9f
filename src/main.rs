//! layerfill CLI
//!
//! Usage:
//!   layerfill [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>  Run configuration (TOML format)
//!   -d, --debug          Print the layer tree before and after substitution
//!   --syntax             Show the layer document syntax reference
//!   -h, --help           Print help

use std::path::PathBuf;

use clap::Parser;

use layerfill::{run, FillConfig, RunOutcome};

#[derive(Parser)]
#[command(name = "layerfill")]
#[command(about = "Fill a layered template with two texts and an image, then export PNG and PDF")]
struct Cli {
    /// Run configuration (TOML format); defaults apply without one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the layer tree before and after substitution
    #[arg(short, long)]
    debug: bool,

    /// Show the layer document syntax reference
    #[arg(long)]
    syntax: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.syntax {
        print_syntax();
        return;
    }

    let config = match &cli.config {
        Some(path) => match FillConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FillConfig::default(),
    };
    let config = if cli.debug {
        config.with_debug(true)
    } else {
        config
    };

    match run(&config) {
        Ok(RunOutcome::Placeholder { pdf }) => {
            println!("Placeholder template; wrote {}", pdf.display());
        }
        Ok(RunOutcome::Composed(report)) => {
            println!("Wrote {} and {}", report.png.display(), report.pdf.display());
            for warning in report.substitution.warnings() {
                println!("  not filled: {}", warning);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e.report());
            std::process::exit(1);
        }
    }
}

fn print_syntax() {
    println!(
        r##"LAYER DOCUMENT SYNTAX
=====================

CANVAS
------
canvas [width: <n>, height: <n>, background: <color>]
    Exactly one per document. Background defaults to transparent.

LAYERS (painted in order, first is bottom-most)
------
group "name" [mods] {{ ... }}       Container; children painted in isolation
text "name" [mods] "content"       Text layer ("\n" starts a new line)
placed "name" [mods] "source"      Embedded, replaceable bitmap
placed "name" [mods]               Same, with a blank white payload
pixels "name" [mods] "source"      Plain raster at native size
fill "name" [mods]                 Solid color rectangle or ellipse

SOURCES
-------
"images/photo.png"                  Path relative to the template file
"data:image/png;base64,iVBOR..."    Embedded image

MODIFIERS
---------
All layers:
    visible: true|false    opacity: 0..1    blend: normal|multiply|screen
text:
    x, y, font_size, color, font: "path.ttf", align: left|center|right
placed:
    x, y, width, height, rotation (clockwise degrees), mask: none|ellipse
pixels:
    x, y
fill:
    x, y, width, height, rotation, color, mask: none|ellipse

COLORS
------
#rgb  #rgba  #rrggbb  #rrggbbaa

FONTS
-----
Text is drawn only when a font file is known: the layer's `font`, or
`default_font` in the [compose] section of the config file. Without one the
layer keeps its new content but is left out of the PNG and PDF, and a
warning is logged. Pick a font that covers the input's script.

SLOTS (defaults, change them with --config)
-----
group "模板"
    group "改文本" {{ text "文字1" ...  text "文字2" ... }}
    group "改图"   {{ placed ... (every direct placed child gets the image) }}

A template file containing "This is a placeholder" produces only a
stand-in PDF."##
    );
}
