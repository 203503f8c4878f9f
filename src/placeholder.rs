//! Placeholder templates
//!
//! A template file containing the sentinel text is not a real template. The
//! run then writes a stand-in PDF and stops.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::output::{write_pdf, Caption, OutputError};

pub const PLACEHOLDER_WIDTH: u32 = 600;
pub const PLACEHOLDER_HEIGHT: u32 = 400;
const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CAPTION_SIZE: f32 = 16.0;

/// Whether the file at `path` contains `sentinel`. The file is read as
/// lossy UTF-8 so binary content does not fail the check.
pub fn is_placeholder(path: &Path, sentinel: &str) -> std::io::Result<bool> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).contains(sentinel))
}

/// Write the 600x400 red stand-in PDF with a white caption at (10, 10)
/// naming the placeholder template
pub fn write_placeholder_pdf(path: &Path, dpi: f32, template: &Path) -> Result<(), OutputError> {
    let image = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, PLACEHOLDER_COLOR);
    let name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| template.display().to_string());
    let caption = Caption {
        text: format!("This is a dummy PDF because {} is a placeholder.", name),
        x: 10.0,
        y: 10.0,
        size: CAPTION_SIZE,
    };
    write_pdf(&image, path, dpi, Some(&caption))
}
