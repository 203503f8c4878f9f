//! Build a layer tree from a parsed layer document
//!
//! Modifier values are type-checked here, embedded sources are decoded and
//! file references are resolved against the template's directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::{Rgba, RgbaImage};

use crate::parser::ast::{
    CanvasDecl, Document, LayerBody, LayerDecl, Modifier, Span, Spanned, Statement, Value,
};

use super::layer::{
    BlendMode, FillLayer, Layer, LayerKind, Mask, PixelLayer, PlacedLayer, TextAlign, TextLayer,
};
use super::transform::Placement;
use super::{Canvas, Template, TemplateError};

const COMMON_KEYS: &[&str] = &["visible", "opacity", "blend"];
const CANVAS_KEYS: &[&str] = &["width", "height", "background"];
const TEXT_KEYS: &[&str] = &["x", "y", "font_size", "color", "font", "align"];
const PLACED_KEYS: &[&str] = &["x", "y", "width", "height", "rotation", "mask"];
const PIXELS_KEYS: &[&str] = &["x", "y"];
const FILL_KEYS: &[&str] = &["x", "y", "width", "height", "rotation", "color", "mask"];

/// Largest canvas or placement side, in pixels
pub const MAX_DIMENSION: u32 = 16384;

const DEFAULT_FONT_SIZE: f32 = 16.0;
const BLANK_PAYLOAD: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Turn a parsed document into a [`Template`]
pub(crate) fn build(doc: &Document, base_dir: &Path) -> Result<Template, TemplateError> {
    let mut canvases = doc.canvases();
    let canvas = match canvases.next() {
        Some(Spanned {
            node: Statement::Canvas(decl),
            span,
        }) => build_canvas(decl, span)?,
        _ => {
            return Err(TemplateError::invalid(
                "missing canvas declaration (e.g. `canvas [width: 800, height: 600]`)",
                0..0,
            ))
        }
    };
    if let Some(extra) = canvases.next() {
        return Err(TemplateError::invalid(
            "only one canvas declaration is allowed",
            extra.span.clone(),
        ));
    }

    let layers = doc
        .layers()
        .map(|decl| build_layer(decl, base_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Template { canvas, layers })
}

fn build_canvas(decl: &CanvasDecl, span: &Span) -> Result<Canvas, TemplateError> {
    let mods = Modifiers::new(&decl.modifiers, "canvas");
    mods.check_keys(&[CANVAS_KEYS])?;

    let width = mods.require_dimension("width", span)?;
    let height = mods.require_dimension("height", span)?;
    let background = mods.color("background")?.unwrap_or(Rgba([0, 0, 0, 0]));

    Ok(Canvas {
        width,
        height,
        background,
    })
}

fn build_layer(decl: &LayerDecl, base_dir: &Path) -> Result<Layer, TemplateError> {
    let name = decl.name.node.clone();
    let mods = Modifiers::new(&decl.modifiers, decl.body.keyword());

    let kind = match &decl.body {
        LayerBody::Group { children } => {
            mods.check_keys(&[COMMON_KEYS])?;
            let children = children
                .iter()
                .map(|child| build_layer(child, base_dir))
                .collect::<Result<Vec<_>, _>>()?;
            LayerKind::Group(children)
        }
        LayerBody::Text { content } => {
            mods.check_keys(&[COMMON_KEYS, TEXT_KEYS])?;
            let font_size = mods.number("font_size")?.unwrap_or(DEFAULT_FONT_SIZE);
            if font_size <= 0.0 {
                return Err(mods.bad_value("font_size", "must be greater than zero"));
            }
            LayerKind::Text(TextLayer {
                content: content.node.clone(),
                x: mods.number("x")?.unwrap_or(0.0),
                y: mods.number("y")?.unwrap_or(0.0),
                font_size,
                color: mods.color("color")?.unwrap_or(Rgba([0, 0, 0, 255])),
                font: mods.string("font")?.map(|f| base_dir.join(f)),
                align: mods
                    .keyword("align", TextAlign::from_keyword, "left, center, right")?
                    .unwrap_or_default(),
            })
        }
        LayerBody::Placed { source } => {
            mods.check_keys(&[COMMON_KEYS, PLACED_KEYS])?;
            let placement = mods.placement(&decl.span)?;
            let content = match source {
                Some(source) => load_source(source, base_dir, &name)?,
                None => RgbaImage::from_pixel(
                    placement.width.round().max(1.0) as u32,
                    placement.height.round().max(1.0) as u32,
                    BLANK_PAYLOAD,
                ),
            };
            let mask = mods
                .keyword("mask", Mask::from_keyword, "none, ellipse")?
                .unwrap_or_default();
            LayerKind::Placed(PlacedLayer::new(placement, mask, Arc::new(content)))
        }
        LayerBody::Pixels { source } => {
            mods.check_keys(&[COMMON_KEYS, PIXELS_KEYS])?;
            LayerKind::Pixels(PixelLayer {
                x: mods.number("x")?.unwrap_or(0.0).round() as i32,
                y: mods.number("y")?.unwrap_or(0.0).round() as i32,
                image: load_source(source, base_dir, &name)?,
            })
        }
        LayerBody::Fill => {
            mods.check_keys(&[COMMON_KEYS, FILL_KEYS])?;
            LayerKind::Fill(FillLayer {
                area: mods.placement(&decl.span)?,
                color: mods.color("color")?.unwrap_or(Rgba([0, 0, 0, 255])),
                mask: mods
                    .keyword("mask", Mask::from_keyword, "none, ellipse")?
                    .unwrap_or_default(),
            })
        }
    };

    let opacity = mods.number("opacity")?.unwrap_or(1.0);
    if !(0.0..=1.0).contains(&opacity) {
        return Err(mods.bad_value("opacity", "must be between 0 and 1"));
    }

    Ok(Layer {
        name,
        visible: mods
            .keyword("visible", parse_bool, "true, false")?
            .unwrap_or(true),
        opacity,
        blend: mods
            .keyword("blend", BlendMode::from_keyword, "normal, multiply, screen")?
            .unwrap_or_default(),
        kind,
    })
}

fn parse_bool(keyword: &str) -> Option<bool> {
    match keyword {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Decode a `data:` URI or load an image file relative to `base_dir`
fn load_source(
    source: &Spanned<String>,
    base_dir: &Path,
    layer: &str,
) -> Result<RgbaImage, TemplateError> {
    let source_error = |reason: String| TemplateError::Source {
        layer: layer.to_string(),
        reason,
        span: source.span.clone(),
    };

    if let Some(rest) = source.node.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| source_error("data URI has no ',' separator".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(source_error(format!(
                "only base64 data URIs are supported, got '{}'",
                header
            )));
        }
        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| source_error(format!("invalid base64 payload: {}", e)))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| source_error(format!("cannot decode embedded image: {}", e)))?;
        return Ok(decoded.to_rgba8());
    }

    let path: PathBuf = base_dir.join(&source.node);
    let decoded = image::open(&path)
        .map_err(|e| source_error(format!("cannot open '{}': {}", path.display(), e)))?;
    Ok(decoded.to_rgba8())
}

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`
pub(crate) fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.strip_prefix('#')?;
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 | 4 => {
            let alpha = if hex.len() == 4 { digit(3)? * 17 } else { 255 };
            Some(Rgba([digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, alpha]))
        }
        6 | 8 => {
            let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
            Some(Rgba([byte(0)?, byte(2)?, byte(4)?, alpha]))
        }
        _ => None,
    }
}

/// Typed access to one declaration's modifier block
struct Modifiers<'a> {
    list: &'a [Spanned<Modifier>],
    owner: &'static str,
}

impl<'a> Modifiers<'a> {
    fn new(list: &'a [Spanned<Modifier>], owner: &'static str) -> Self {
        Self { list, owner }
    }

    fn get(&self, key: &str) -> Option<&'a Spanned<Modifier>> {
        self.list.iter().find(|m| m.node.key.node == key)
    }

    fn check_keys(&self, allowed: &[&[&str]]) -> Result<(), TemplateError> {
        for m in self.list {
            let key = m.node.key.node.as_str();
            if !allowed.iter().any(|set| set.contains(&key)) {
                let valid: Vec<&str> = allowed.iter().flat_map(|set| set.iter().copied()).collect();
                return Err(TemplateError::invalid(
                    format!(
                        "unknown modifier '{}' for {} (valid: {})",
                        key,
                        self.owner,
                        valid.join(", ")
                    ),
                    m.node.key.span.clone(),
                ));
            }
        }
        Ok(())
    }

    fn bad_value(&self, key: &str, reason: &str) -> TemplateError {
        let span = self.get(key).map(|m| m.node.value.span.clone()).unwrap_or(0..0);
        TemplateError::invalid(format!("'{}' {}", key, reason), span)
    }

    fn too_large(&self, key: &str) -> TemplateError {
        self.bad_value(key, &format!("is too large (at most {})", MAX_DIMENSION))
    }

    fn mismatch(&self, m: &Spanned<Modifier>, expected: &str) -> TemplateError {
        TemplateError::invalid(
            format!(
                "'{}' expects a {}, got a {}",
                m.node.key.node,
                expected,
                m.node.value.node.describe()
            ),
            m.node.value.span.clone(),
        )
    }

    fn number(&self, key: &str) -> Result<Option<f32>, TemplateError> {
        match self.get(key) {
            None => Ok(None),
            Some(m) => match &m.node.value.node {
                Value::Number(n) => Ok(Some(*n as f32)),
                _ => Err(self.mismatch(m, "number")),
            },
        }
    }

    fn string(&self, key: &str) -> Result<Option<&'a str>, TemplateError> {
        match self.get(key) {
            None => Ok(None),
            Some(m) => match &m.node.value.node {
                Value::String(s) => Ok(Some(s.as_str())),
                _ => Err(self.mismatch(m, "string")),
            },
        }
    }

    fn color(&self, key: &str) -> Result<Option<Rgba<u8>>, TemplateError> {
        match self.get(key) {
            None => Ok(None),
            Some(m) => match &m.node.value.node {
                Value::Color(c) => parse_hex_color(c).map(Some).ok_or_else(|| {
                    TemplateError::invalid(
                        format!("'{}' is not a valid color", c),
                        m.node.value.span.clone(),
                    )
                }),
                _ => Err(self.mismatch(m, "color")),
            },
        }
    }

    fn keyword<T>(
        &self,
        key: &str,
        parse: impl Fn(&str) -> Option<T>,
        valid: &str,
    ) -> Result<Option<T>, TemplateError> {
        match self.get(key) {
            None => Ok(None),
            Some(m) => match &m.node.value.node {
                Value::Keyword(k) => parse(k).map(Some).ok_or_else(|| {
                    TemplateError::invalid(
                        format!("invalid value '{}' for '{}' (valid: {})", k, key, valid),
                        m.node.value.span.clone(),
                    )
                }),
                _ => Err(self.mismatch(m, "keyword")),
            },
        }
    }

    fn require_dimension(&self, key: &str, owner_span: &Span) -> Result<u32, TemplateError> {
        let value = self.number(key)?.ok_or_else(|| {
            TemplateError::invalid(
                format!("{} requires '{}'", self.owner, key),
                owner_span.clone(),
            )
        })?;
        if value < 1.0 {
            return Err(self.bad_value(key, "must be at least 1"));
        }
        if value.round() > MAX_DIMENSION as f32 {
            return Err(self.too_large(key));
        }
        Ok(value.round() as u32)
    }

    fn require_extent(&self, key: &str, owner_span: &Span) -> Result<f32, TemplateError> {
        let value = self.number(key)?.ok_or_else(|| {
            TemplateError::invalid(
                format!("{} requires '{}'", self.owner, key),
                owner_span.clone(),
            )
        })?;
        if value <= 0.0 {
            return Err(self.bad_value(key, "must be greater than zero"));
        }
        if value.round() > MAX_DIMENSION as f32 {
            return Err(self.too_large(key));
        }
        Ok(value)
    }

    fn placement(&self, owner_span: &Span) -> Result<Placement, TemplateError> {
        Ok(Placement::new(
            self.number("x")?.unwrap_or(0.0),
            self.number("y")?.unwrap_or(0.0),
            self.require_extent("width", owner_span)?,
            self.require_extent("height", owner_span)?,
        )
        .with_rotation(self.number("rotation")?.unwrap_or(0.0)))
    }
}
