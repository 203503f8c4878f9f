//! Straight-alpha pixel compositing
//!
//! Source-over with a separable blend function:
//!
//! ```text
//! αo = αs + αb · (1 - αs)
//! Co = (αs · ((1 - αb) · Cs + αb · B(Cb, Cs)) + αb · Cb · (1 - αs)) / αo
//! ```

use image::{Rgba, RgbaImage};

use crate::template::BlendMode;

fn blend_channel(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Normal => cs,
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => cb + cs - cb * cs,
    }
}

/// Paint `src` over `dst` in place
pub fn composite(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32, mode: BlendMode) {
    let sa = src[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let oa = sa + da * (1.0 - sa);

    for i in 0..3 {
        let cs = src[i] as f32 / 255.0;
        let cb = dst[i] as f32 / 255.0;
        let mixed = (1.0 - da) * cs + da * blend_channel(mode, cb, cs);
        let co = (sa * mixed + da * cb * (1.0 - sa)) / oa;
        dst[i] = to_byte(co);
    }
    dst[3] = to_byte(oa);
}

/// Paint a whole image onto `dst` with its top-left corner at `(x, y)`.
/// Pixels falling outside `dst` are clipped.
pub fn composite_image(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    x: i64,
    y: i64,
    opacity: f32,
    mode: BlendMode,
) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    for (sx, sy, pixel) in src.enumerate_pixels() {
        let tx = x + sx as i64;
        let ty = y + sy as i64;
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        composite(dst.get_pixel_mut(tx as u32, ty as u32), *pixel, opacity, mode);
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
