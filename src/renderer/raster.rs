//! Flatten a layer tree into one raster

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{imageops, Rgba, RgbaImage};
use log::{debug, warn};
use rusttype::Font;

use super::blend::{composite, composite_image};
use super::config::ComposeConfig;
use super::text;
use crate::template::{Layer, LayerKind, Mask, PlacedLayer, Placement, Point, Template, TextLayer};

/// Composes templates into RGBA rasters.
///
/// Fonts are cached by path for the lifetime of the compositor, failed loads
/// included, so a missing font is reported once.
pub struct Compositor {
    config: ComposeConfig,
    fonts: HashMap<PathBuf, Option<Font<'static>>>,
}

impl Compositor {
    pub fn new(config: ComposeConfig) -> Self {
        Self {
            config,
            fonts: HashMap::new(),
        }
    }

    /// Paint every visible layer over the canvas background
    pub fn compose(&mut self, template: &Template) -> RgbaImage {
        let canvas = template.canvas;
        let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, canvas.background);
        self.paint_layers(&mut out, &template.layers);
        out
    }

    fn paint_layers(&mut self, target: &mut RgbaImage, layers: &[Layer]) {
        for layer in layers {
            if !layer.visible {
                debug!("skipping hidden layer '{}'", layer.name);
                continue;
            }
            self.paint_layer(target, layer);
        }
    }

    fn paint_layer(&mut self, target: &mut RgbaImage, layer: &Layer) {
        let (width, height) = target.dimensions();
        match &layer.kind {
            LayerKind::Group(children) => {
                let mut isolated = RgbaImage::new(width, height);
                self.paint_layers(&mut isolated, children);
                composite_image(target, &isolated, 0, 0, layer.opacity, layer.blend);
            }
            LayerKind::Text(text) => {
                if let Some(buf) = self.rasterize_text(&layer.name, text, width, height) {
                    composite_image(target, &buf, 0, 0, layer.opacity, layer.blend);
                }
            }
            LayerKind::Placed(placed) => {
                let resized = self.resample(placed);
                paint_transformed(target, &placed.placement, placed.mask, layer, |lx, ly| {
                    let px = (lx as u32).min(resized.width().saturating_sub(1));
                    let py = (ly as u32).min(resized.height().saturating_sub(1));
                    *resized.get_pixel(px, py)
                });
            }
            LayerKind::Pixels(pixels) => {
                composite_image(
                    target,
                    &pixels.image,
                    pixels.x as i64,
                    pixels.y as i64,
                    layer.opacity,
                    layer.blend,
                );
            }
            LayerKind::Fill(fill) => {
                paint_transformed(target, &fill.area, fill.mask, layer, |_, _| fill.color);
            }
        }
    }

    /// Resample the payload to the placement's pixel size. No aspect fitting.
    fn resample(&self, placed: &PlacedLayer) -> RgbaImage {
        let w = placed.placement.width.round().max(1.0) as u32;
        let h = placed.placement.height.round().max(1.0) as u32;
        let content = placed.content();
        if content.dimensions() == (w, h) {
            return content.as_ref().clone();
        }
        imageops::resize(content.as_ref(), w, h, self.config.resample.filter())
    }

    fn rasterize_text(
        &mut self,
        name: &str,
        layer: &TextLayer,
        width: u32,
        height: u32,
    ) -> Option<RgbaImage> {
        if layer.content.is_empty() {
            return None;
        }
        let Some(path) = layer
            .font
            .clone()
            .or_else(|| self.config.default_font.clone())
        else {
            warn!(
                "text layer '{}' has no font and no default font is configured; not rendered",
                name
            );
            return None;
        };
        let font = self.font(&path)?;
        Some(text::rasterize(font, layer, width, height))
    }

    fn font(&mut self, path: &Path) -> Option<&Font<'static>> {
        self.fonts
            .entry(path.to_path_buf())
            .or_insert_with(|| match text::load_font(path) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!("cannot load font {}; text using it is not rendered", e);
                    None
                }
            })
            .as_ref()
    }
}

/// Paint a placement box pixel by pixel. Each canvas pixel inside the
/// box's loose bounds is mapped back into box-local space and sampled there.
fn paint_transformed<F>(
    target: &mut RgbaImage,
    placement: &Placement,
    mask: Mask,
    layer: &Layer,
    sample: F,
) where
    F: Fn(f32, f32) -> Rgba<u8>,
{
    let (width, height) = target.dimensions();
    let bounds = placement.bounds();
    let x0 = bounds.min_x.floor().max(0.0) as u32;
    let y0 = bounds.min_y.floor().max(0.0) as u32;
    let x1 = (bounds.max_x.ceil().max(0.0) as u32).min(width);
    let y1 = (bounds.max_y.ceil().max(0.0) as u32).min(height);

    for y in y0..y1 {
        for x in x0..x1 {
            let local = placement.to_local(Point::new(x as f32 + 0.5, y as f32 + 0.5));
            if !placement.contains_local(local) || !inside_mask(mask, placement, local) {
                continue;
            }
            let src = sample(local.x, local.y);
            composite(target.get_pixel_mut(x, y), src, layer.opacity, layer.blend);
        }
    }
}

fn inside_mask(mask: Mask, placement: &Placement, local: Point) -> bool {
    match mask {
        Mask::None => true,
        Mask::Ellipse => {
            let rx = placement.width / 2.0;
            let ry = placement.height / 2.0;
            let dx = (local.x - rx) / rx;
            let dy = (local.y - ry) / ry;
            dx * dx + dy * dy <= 1.0
        }
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(ComposeConfig::default())
    }
}
