//! layerfill - fill a layered template with two texts and an image
//!
//! The pipeline reads a layer document, writes the user's texts into two named
//! text layers, swaps the embedded bitmap of every placed layer in the image
//! group and flattens the result into a PNG and a PDF.
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use layerfill::{substitute::substitute_texts, SlotNames, Template};
//!
//! let mut template = Template::from_source(
//!     r#"
//!     canvas [width: 200, height: 100]
//!     group "模板" {
//!         group "改文本" {
//!             text "文字1" "old"
//!             text "文字2" "old"
//!         }
//!     }
//!     "#,
//!     Path::new("."),
//! )
//! .unwrap();
//!
//! let reports = substitute_texts(
//!     &mut template.layers,
//!     &SlotNames::default(),
//!     [("文字1", "Hello"), ("文字2", "World")],
//! );
//! assert!(reports.iter().all(|r| r.result.is_ok()));
//! ```

pub mod config;
pub mod error;
pub mod inputs;
pub mod output;
pub mod parser;
pub mod placeholder;
pub mod renderer;
pub mod substitute;
pub mod template;

use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info, warn};
use thiserror::Error;

pub use config::{ConfigError, FillConfig, InputPaths, SlotNames};
pub use error::ParseError;
pub use inputs::Inputs;
pub use output::OutputError;
pub use parser::{parse, Document};
pub use renderer::{ComposeConfig, Compositor, Resample};
pub use substitute::SubstitutionReport;
pub use template::{SlotError, Template, TemplateError};

/// Errors that abort a run. Nothing is written once one of these occurs,
/// except outputs already completed before it.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("cannot read template '{}': {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read text input '{}': {source}", .path.display())]
    MissingText {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot load image '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid template '{}': {source}", .path.display())]
    Template {
        path: PathBuf,
        source: TemplateError,
    },

    #[error("cannot write '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        source: OutputError,
    },
}

impl FillError {
    /// Human-readable report. Template errors get source context when the
    /// template file can still be read.
    pub fn report(&self) -> String {
        if let FillError::Template { path, source } = self {
            if let Ok(text) = std::fs::read_to_string(path) {
                return source.format(&text, &path.display().to_string());
            }
        }
        self.to_string()
    }
}

/// Files written by a completed run and what substitution achieved
#[derive(Debug)]
pub struct RunReport {
    pub png: PathBuf,
    pub pdf: PathBuf,
    pub substitution: SubstitutionReport,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The template was a placeholder; only the stand-in PDF was written
    Placeholder { pdf: PathBuf },
    Composed(RunReport),
}

/// Run the whole pipeline with `config`
pub fn run(config: &FillConfig) -> Result<RunOutcome, FillError> {
    let paths = &config.paths;

    let is_placeholder = placeholder::is_placeholder(&paths.template, &config.sentinel)
        .map_err(|source| FillError::TemplateRead {
            path: paths.template.clone(),
            source,
        })?;
    if is_placeholder {
        warn!("==============================================");
        warn!("{} is a placeholder template", paths.template.display());
        warn!("writing a dummy PDF to {}", paths.output_pdf.display());
        warn!("==============================================");
        placeholder::write_placeholder_pdf(&paths.output_pdf, config.pdf_dpi, &paths.template)
            .map_err(|source| output_error(&paths.output_pdf, source))?;
        return Ok(RunOutcome::Placeholder {
            pdf: paths.output_pdf.clone(),
        });
    }

    let inputs = Inputs::load(paths)?;

    let mut template =
        Template::from_file(&paths.template).map_err(|source| FillError::Template {
            path: paths.template.clone(),
            source,
        })?;
    info!(
        "loaded template {} ({}x{}, {} layers)",
        paths.template.display(),
        template.canvas.width,
        template.canvas.height,
        template.layer_count()
    );
    if config.debug {
        print_outline("before substitution", &template);
    }

    let substitution = substitute::apply(&mut template, &config.slots, &inputs);
    if config.debug {
        print_outline("after substitution", &template);
    }

    let composed = Compositor::new(config.compose.clone()).compose(&template);
    debug!("composed {}x{} raster", composed.width(), composed.height());

    output::save_png(&composed, &paths.output_png)
        .map_err(|source| output_error(&paths.output_png, source))?;
    output::save_pdf(
        &DynamicImage::ImageRgba8(composed),
        &paths.output_pdf,
        config.pdf_dpi,
    )
    .map_err(|source| output_error(&paths.output_pdf, source))?;

    if !substitution.is_complete() {
        warn!(
            "finished with {} unfilled slot(s)",
            substitution.warnings().len()
        );
    }

    Ok(RunOutcome::Composed(RunReport {
        png: paths.output_png.clone(),
        pdf: paths.output_pdf.clone(),
        substitution,
    }))
}

fn output_error(path: &Path, source: OutputError) -> FillError {
    FillError::Output {
        path: path.to_path_buf(),
        source,
    }
}

fn print_outline(stage: &str, template: &Template) {
    eprintln!("=== Layer Tree ({}) ===", stage);
    eprint!("{}", template.outline());
    eprintln!("=========================");
}
