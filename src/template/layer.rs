//! Layer tree node types

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::resolver::SlotError;
use super::transform::Placement;

/// How a layer's pixels combine with what is already painted below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
}

impl BlendMode {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "normal" => Some(BlendMode::Normal),
            "multiply" => Some(BlendMode::Multiply),
            "screen" => Some(BlendMode::Screen),
            _ => None,
        }
    }
}

/// Optional clip shape applied inside a layer's placement box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mask {
    #[default]
    None,
    Ellipse,
}

impl Mask {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "none" => Some(Mask::None),
            "ellipse" => Some(Mask::Ellipse),
            _ => None,
        }
    }
}

/// Horizontal anchoring of text relative to the layer's `x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            _ => None,
        }
    }
}

/// A node in the layer tree
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Not unique; lookups return the first depth-first match
    pub name: String,
    pub visible: bool,
    /// 0.0 (transparent) to 1.0 (opaque)
    pub opacity: f32,
    pub blend: BlendMode,
    pub kind: LayerKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// Container with children in paint order
    Group(Vec<Layer>),
    Text(TextLayer),
    /// Embedded, replaceable bitmap
    Placed(PlacedLayer),
    /// Plain raster content
    Pixels(PixelLayer),
    /// Solid color shape
    Fill(FillLayer),
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            visible: true,
            opacity: 1.0,
            blend: BlendMode::Normal,
            kind,
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<Layer>) -> Self {
        Self::new(name, LayerKind::Group(children))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group(_))
    }

    /// Keyword naming this layer's kind (`group`, `text`, `placed`, ...)
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LayerKind::Group(_) => "group",
            LayerKind::Text(_) => "text",
            LayerKind::Placed(_) => "placed",
            LayerKind::Pixels(_) => "pixels",
            LayerKind::Fill(_) => "fill",
        }
    }

    pub fn children(&self) -> Option<&[Layer]> {
        match &self.kind {
            LayerKind::Group(children) => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut [Layer]> {
        match &mut self.kind {
            LayerKind::Group(children) => Some(children),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.kind {
            LayerKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the text payload for mutation; any other kind is a
    /// [`SlotError::WrongKind`]
    pub fn as_text_mut(&mut self) -> Result<&mut TextLayer, SlotError> {
        let found = self.kind_name();
        match &mut self.kind {
            LayerKind::Text(text) => Ok(text),
            _ => Err(SlotError::WrongKind {
                name: self.name.clone(),
                expected: "text",
                found,
            }),
        }
    }

    pub fn as_placed(&self) -> Option<&PlacedLayer> {
        match &self.kind {
            LayerKind::Placed(placed) => Some(placed),
            _ => None,
        }
    }

    pub fn as_placed_mut(&mut self) -> Option<&mut PlacedLayer> {
        match &mut self.kind {
            LayerKind::Placed(placed) => Some(placed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub content: String,
    /// Anchor x (left edge, center or right edge depending on `align`)
    pub x: f32,
    /// Top of the first line
    pub y: f32,
    /// Pixel height of the font
    pub font_size: f32,
    pub color: Rgba<u8>,
    /// Font file, already resolved against the template directory
    pub font: Option<PathBuf>,
    pub align: TextAlign,
}

impl TextLayer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            x: 0.0,
            y: 0.0,
            font_size: 16.0,
            color: Rgba([0, 0, 0, 255]),
            font: None,
            align: TextAlign::Left,
        }
    }

    /// Replace the whole content
    pub fn set_text(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

/// Embedded bitmap drawn through a placement transform
#[derive(Clone, PartialEq)]
pub struct PlacedLayer {
    pub placement: Placement,
    pub mask: Mask,
    content: Arc<RgbaImage>,
}

impl PlacedLayer {
    pub fn new(placement: Placement, mask: Mask, content: Arc<RgbaImage>) -> Self {
        Self {
            placement,
            mask,
            content,
        }
    }

    pub fn content(&self) -> &Arc<RgbaImage> {
        &self.content
    }

    /// Swap the embedded bitmap. The placement stays as it is, so the new
    /// content is resampled into the existing box when composed.
    pub fn replace(&mut self, content: Arc<RgbaImage>) {
        self.content = content;
    }
}

impl fmt::Debug for PlacedLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacedLayer")
            .field("placement", &self.placement)
            .field("mask", &self.mask)
            .field("content", &self.content.dimensions())
            .finish()
    }
}

/// Plain raster drawn at its native size
#[derive(Clone, PartialEq)]
pub struct PixelLayer {
    pub x: i32,
    pub y: i32,
    pub image: RgbaImage,
}

impl fmt::Debug for PixelLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelLayer")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("image", &self.image.dimensions())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillLayer {
    pub area: Placement,
    pub color: Rgba<u8>,
    pub mask: Mask,
}
