//! Text rasterization with rusttype

use std::path::Path;

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use crate::template::{TextAlign, TextLayer};

/// Read a TrueType/OpenType font file
pub fn load_font(path: &Path) -> Result<Font<'static>, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Font::try_from_vec(bytes).ok_or_else(|| format!("{}: not a usable font file", path.display()))
}

/// Advance width of a single line, kerning included
pub fn line_width(font: &Font<'static>, px: f32, line: &str) -> f32 {
    let scale = Scale::uniform(px);
    font.layout(line, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Rasterize a text layer into a transparent buffer of the given size.
///
/// Lines are split on `\n`. The first line's top sits at the layer's `y`;
/// `x` is the left edge, center or right edge depending on alignment.
/// Glyph coverage becomes alpha, scaled by the color's own alpha.
pub fn rasterize(font: &Font<'static>, text: &TextLayer, width: u32, height: u32) -> RgbaImage {
    let mut buf = RgbaImage::new(width, height);
    let scale = Scale::uniform(text.font_size);
    let v_metrics = font.v_metrics(scale);
    let line_height = v_metrics.ascent - v_metrics.descent + v_metrics.line_gap;
    let [r, g, b, a] = text.color.0;

    for (i, line) in text.content.split('\n').enumerate() {
        let left = match text.align {
            TextAlign::Left => text.x,
            TextAlign::Center => text.x - line_width(font, text.font_size, line) / 2.0,
            TextAlign::Right => text.x - line_width(font, text.font_size, line),
        };
        let baseline = text.y + v_metrics.ascent + i as f32 * line_height;

        for glyph in font.layout(line, scale, point(left, baseline)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let alpha = (v.clamp(0.0, 1.0) * a as f32).round() as u8;
                let dst = buf.get_pixel_mut(px as u32, py as u32);
                // Overlapping glyph edges keep the stronger coverage
                if alpha > dst[3] {
                    *dst = Rgba([r, g, b, alpha]);
                }
            });
        }
    }
    buf
}
