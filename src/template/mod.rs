//! Layered templates
//!
//! A [`Template`] is the in-memory form of a layer document: a canvas plus an
//! ordered forest of [`Layer`]s. It is built once from source, mutated in
//! place by substitution and then handed to the compositor.
//!
//! # Example
//!
//! ```text
//! canvas [width: 400, height: 300]
//!
//! group "模板" {
//!     group "改文本" {
//!         text "文字1" [x: 20, y: 20, font_size: 24] "Title"
//!     }
//!     group "改图" {
//!         placed "圆1" [x: 20, y: 80, width: 160, height: 160, mask: ellipse]
//!     }
//! }
//! ```

mod build;
mod layer;
mod resolver;
mod transform;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use image::Rgba;
use thiserror::Error;

use crate::error::{render_report, Span};
use crate::ParseError;

pub use layer::{
    BlendMode, FillLayer, Layer, LayerKind, Mask, PixelLayer, PlacedLayer, TextAlign, TextLayer,
};
pub use resolver::{
    find_child, find_child_mut, find_first, find_first_mut, find_group, find_group_mut,
    require_group_mut, require_nested_group_mut, SlotError,
};
pub use build::MAX_DIMENSION;
pub use transform::{Bounds, Placement, Point};

/// Errors raised while loading a template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read template '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} syntax error(s): {}", .0.len(), join_messages(.0))]
    Parse(Vec<ParseError>),

    #[error("{message}")]
    Invalid { message: String, span: Span },

    #[error("layer '{layer}': {reason}")]
    Source {
        layer: String,
        reason: String,
        span: Span,
    },
}

fn join_messages(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl TemplateError {
    pub(crate) fn invalid(message: impl Into<String>, span: Span) -> Self {
        TemplateError::Invalid {
            message: message.into(),
            span,
        }
    }

    /// Render the error with source context, one report per syntax error
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            TemplateError::Read { .. } => self.to_string(),
            TemplateError::Parse(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            TemplateError::Invalid { message, span } => {
                render_report(source, filename, span, message, message)
            }
            TemplateError::Source { reason, span, .. } => {
                render_report(source, filename, span, &self.to_string(), reason)
            }
        }
    }
}

/// Output raster size and the color it starts from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
}

/// A loaded layer document
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub canvas: Canvas,
    /// Root layers in paint order
    pub layers: Vec<Layer>,
}

impl Template {
    /// Load a template file. Relative sources inside it resolve against the
    /// file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_source(&source, base_dir)
    }

    pub fn from_source(source: &str, base_dir: &Path) -> Result<Self, TemplateError> {
        let doc = crate::parse(source).map_err(TemplateError::Parse)?;
        build::build(&doc, base_dir)
    }

    /// One line per layer: two spaces per depth, `kind "name"`, and a
    /// ` (hidden)` suffix for invisible layers
    pub fn outline(&self) -> String {
        fn walk(out: &mut String, layers: &[Layer], depth: usize) {
            for layer in layers {
                let _ = write!(
                    out,
                    "{}{} \"{}\"",
                    "  ".repeat(depth),
                    layer.kind_name(),
                    layer.name
                );
                if !layer.visible {
                    out.push_str(" (hidden)");
                }
                out.push('\n');
                if let Some(children) = layer.children() {
                    walk(out, children, depth + 1);
                }
            }
        }

        let mut out = String::new();
        walk(&mut out, &self.layers, 0);
        out
    }

    /// Total number of layers, groups included
    pub fn layer_count(&self) -> usize {
        fn count(layers: &[Layer]) -> usize {
            layers
                .iter()
                .map(|l| 1 + l.children().map(count).unwrap_or(0))
                .sum()
        }
        count(&self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        canvas [width: 100, height: 80]
        group "模板" {
            fill "bg" [width: 100, height: 80, color: #eeeeee]
            group "改文本" {
                text "文字1" "one"
                text "文字2" [visible: false] "two"
            }
            group "改图" {
                placed "圆1" [width: 10, height: 10]
            }
        }
    "#;

    #[test]
    fn test_outline() {
        let t = Template::from_source(SAMPLE, Path::new(".")).unwrap();
        insta::assert_snapshot!(t.outline(), @r###"
        group "模板"
          fill "bg"
          group "改文本"
            text "文字1"
            text "文字2" (hidden)
          group "改图"
            placed "圆1"
        "###);
    }

    #[test]
    fn test_layer_count() {
        let t = Template::from_source(SAMPLE, Path::new(".")).unwrap();
        assert_eq!(t.layer_count(), 7);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Template::from_source("canvas [width: 1, height: 1] group {", Path::new("."))
            .unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)));
        let rendered = err.format("canvas [width: 1, height: 1] group {", "bad.layers");
        assert!(rendered.contains("bad.layers"));
    }

    #[test]
    fn test_invalid_error_format_has_context() {
        let src = "canvas [width: 1, height: 1, depth: 3]";
        let err = Template::from_source(src, Path::new(".")).unwrap_err();
        let rendered = err.format(src, "t.layers");
        assert!(rendered.contains("unknown modifier 'depth'"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Template::from_file("definitely/not/here.layers").unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
        assert!(err.to_string().contains("here.layers"));
    }
}
